//! Shape kinds and their geometry
//!
//! A shape kind is only a tag picking which primitive to build. The
//! geometry carries the primitive's dimensions and answers the questions
//! the rest of the sim asks about it: distance, bounds, surface points.

use glam::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::{PI, TAU};

use super::sdf;

/// The eight primitive kinds that can spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Box = 0,
    Sphere,
    Pyramid,
    Torus,
    Capsule,
    Cylinder,
    Cone,
    Tube,
}

impl ShapeKind {
    /// Every kind, in discriminant order
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Pyramid,
        ShapeKind::Torus,
        ShapeKind::Capsule,
        ShapeKind::Cylinder,
        ShapeKind::Cone,
        ShapeKind::Tube,
    ];

    /// Pick a kind uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Pyramid => "Pyramid",
            ShapeKind::Torus => "Torus",
            ShapeKind::Capsule => "Capsule",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::Cone => "Cone",
            ShapeKind::Tube => "Tube",
        }
    }

    /// The primitive built for this kind
    pub fn geometry(self) -> ShapeGeometry {
        match self {
            ShapeKind::Box => ShapeGeometry::Box {
                width: 1.0,
                height: 1.0,
                length: 1.0,
                chamfer_radius: 0.0,
            },
            ShapeKind::Sphere => ShapeGeometry::Sphere { radius: 0.5 },
            ShapeKind::Pyramid => ShapeGeometry::Pyramid {
                width: 1.0,
                height: 1.0,
                length: 1.0,
            },
            ShapeKind::Torus => ShapeGeometry::Torus {
                ring_radius: 0.5,
                pipe_radius: 0.25,
            },
            ShapeKind::Capsule => ShapeGeometry::Capsule {
                cap_radius: 0.3,
                height: 2.5,
            },
            ShapeKind::Cylinder => ShapeGeometry::Cylinder {
                radius: 0.3,
                height: 2.5,
            },
            ShapeKind::Cone => ShapeGeometry::Cone {
                top_radius: 0.25,
                bottom_radius: 0.5,
                height: 1.0,
            },
            ShapeKind::Tube => ShapeGeometry::Tube {
                inner_radius: 0.25,
                outer_radius: 0.5,
                height: 1.0,
            },
        }
    }
}

/// Primitive geometry with its dimensions (scene units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    Box {
        width: f32,
        height: f32,
        length: f32,
        chamfer_radius: f32,
    },
    Sphere {
        radius: f32,
    },
    Pyramid {
        width: f32,
        height: f32,
        length: f32,
    },
    Torus {
        ring_radius: f32,
        pipe_radius: f32,
    },
    Capsule {
        cap_radius: f32,
        height: f32,
    },
    Cylinder {
        radius: f32,
        height: f32,
    },
    Cone {
        top_radius: f32,
        bottom_radius: f32,
        height: f32,
    },
    Tube {
        inner_radius: f32,
        outer_radius: f32,
        height: f32,
    },
}

impl ShapeGeometry {
    /// Signed distance from a node-local point to the surface
    pub fn sdf(&self, p: Vec3) -> f32 {
        match *self {
            ShapeGeometry::Box {
                width,
                height,
                length,
                chamfer_radius,
            } => {
                let half = Vec3::new(width, height, length) * 0.5 - Vec3::splat(chamfer_radius);
                sdf::sd_box(p, half) - chamfer_radius
            }
            ShapeGeometry::Sphere { radius } => sdf::sd_sphere(p, radius),
            ShapeGeometry::Pyramid {
                width,
                height,
                length,
            } => sdf::sd_pyramid(p, width, height, length),
            ShapeGeometry::Torus {
                ring_radius,
                pipe_radius,
            } => sdf::sd_torus(p, ring_radius, pipe_radius),
            ShapeGeometry::Capsule { cap_radius, height } => sdf::sd_capsule(p, cap_radius, height),
            ShapeGeometry::Cylinder { radius, height } => sdf::sd_cylinder(p, radius, height),
            ShapeGeometry::Cone {
                top_radius,
                bottom_radius,
                height,
            } => sdf::sd_cone(p, top_radius, bottom_radius, height),
            ShapeGeometry::Tube {
                inner_radius,
                outer_radius,
                height,
            } => sdf::sd_tube(p, inner_radius, outer_radius, height),
        }
    }

    /// Radius of a sphere around the local origin enclosing the primitive
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            ShapeGeometry::Box {
                width,
                height,
                length,
                ..
            } => Vec3::new(width, height, length).length() * 0.5,
            ShapeGeometry::Sphere { radius } => radius,
            ShapeGeometry::Pyramid {
                width,
                height,
                length,
            } => height.max(Vec2::new(width, length).length() * 0.5),
            ShapeGeometry::Torus {
                ring_radius,
                pipe_radius,
            } => ring_radius + pipe_radius,
            ShapeGeometry::Capsule { height, .. } => height * 0.5,
            ShapeGeometry::Cylinder { radius, height } => Vec2::new(radius, height * 0.5).length(),
            ShapeGeometry::Cone {
                top_radius,
                bottom_radius,
                height,
            } => Vec2::new(top_radius.max(bottom_radius), height * 0.5).length(),
            ShapeGeometry::Tube {
                outer_radius,
                height,
                ..
            } => Vec2::new(outer_radius, height * 0.5).length(),
        }
    }

    /// Sample a point on the surface, in node-local space.
    ///
    /// Faces are picked proportionally to their area so emitters look
    /// evenly spread.
    pub fn sample_surface<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match *self {
            ShapeGeometry::Box {
                width,
                height,
                length,
                ..
            } => {
                let half = Vec3::new(width, height, length) * 0.5;
                let areas = [height * length, width * length, width * height];
                let axis = pick_weighted(rng, &areas);
                let mut p = Vec3::new(
                    rng.random_range(-half.x..=half.x),
                    rng.random_range(-half.y..=half.y),
                    rng.random_range(-half.z..=half.z),
                );
                let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                p[axis] = half[axis] * sign;
                p
            }
            ShapeGeometry::Sphere { radius } => random_unit_vector(rng) * radius,
            ShapeGeometry::Pyramid {
                width,
                height,
                length,
            } => {
                let hx = width * 0.5;
                let hz = length * 0.5;
                let apex = Vec3::new(0.0, height, 0.0);
                let slant_x = Vec2::new(height, hz).length();
                let slant_z = Vec2::new(height, hx).length();
                // Base, then the +X/-X faces, then the +Z/-Z faces
                let areas = [width * length, length * slant_z, width * slant_x];
                match pick_weighted(rng, &areas) {
                    0 => Vec3::new(
                        rng.random_range(-hx..=hx),
                        0.0,
                        rng.random_range(-hz..=hz),
                    ),
                    1 => {
                        let sx = if rng.random_bool(0.5) { hx } else { -hx };
                        sample_triangle(rng, Vec3::new(sx, 0.0, -hz), Vec3::new(sx, 0.0, hz), apex)
                    }
                    _ => {
                        let sz = if rng.random_bool(0.5) { hz } else { -hz };
                        sample_triangle(rng, Vec3::new(-hx, 0.0, sz), Vec3::new(hx, 0.0, sz), apex)
                    }
                }
            }
            ShapeGeometry::Torus {
                ring_radius,
                pipe_radius,
            } => {
                let u = rng.random_range(0.0..TAU);
                let v = rng.random_range(0.0..TAU);
                let r = ring_radius + pipe_radius * v.cos();
                Vec3::new(r * u.cos(), pipe_radius * v.sin(), r * u.sin())
            }
            ShapeGeometry::Capsule { cap_radius, height } => {
                let half = (height * 0.5 - cap_radius).max(0.0);
                let side = TAU * cap_radius * 2.0 * half;
                let caps = 4.0 * PI * cap_radius * cap_radius;
                if pick_weighted(rng, &[side, caps]) == 0 {
                    let (x, z) = random_circle_point(rng, cap_radius);
                    Vec3::new(x, rng.random_range(-half..=half), z)
                } else {
                    let n = random_unit_vector(rng);
                    let offset = if n.y >= 0.0 { half } else { -half };
                    n * cap_radius + Vec3::new(0.0, offset, 0.0)
                }
            }
            ShapeGeometry::Cylinder { radius, height } => {
                let h = height * 0.5;
                let side = TAU * radius * height;
                let caps = 2.0 * PI * radius * radius;
                if pick_weighted(rng, &[side, caps]) == 0 {
                    let (x, z) = random_circle_point(rng, radius);
                    Vec3::new(x, rng.random_range(-h..=h), z)
                } else {
                    let (x, z) = random_disc_point(rng, 0.0, radius);
                    let y = if rng.random_bool(0.5) { h } else { -h };
                    Vec3::new(x, y, z)
                }
            }
            ShapeGeometry::Cone {
                top_radius,
                bottom_radius,
                height,
            } => {
                let h = height * 0.5;
                let slant = Vec2::new(bottom_radius - top_radius, height).length();
                let side = PI * (top_radius + bottom_radius) * slant;
                let bottom = PI * bottom_radius * bottom_radius;
                let top = PI * top_radius * top_radius;
                match pick_weighted(rng, &[side, bottom, top]) {
                    0 => {
                        let t: f32 = rng.random();
                        let r = bottom_radius + (top_radius - bottom_radius) * t;
                        let (x, z) = random_circle_point(rng, r);
                        Vec3::new(x, -h + height * t, z)
                    }
                    1 => {
                        let (x, z) = random_disc_point(rng, 0.0, bottom_radius);
                        Vec3::new(x, -h, z)
                    }
                    _ => {
                        let (x, z) = random_disc_point(rng, 0.0, top_radius);
                        Vec3::new(x, h, z)
                    }
                }
            }
            ShapeGeometry::Tube {
                inner_radius,
                outer_radius,
                height,
            } => {
                let h = height * 0.5;
                let outer = TAU * outer_radius * height;
                let inner = TAU * inner_radius * height;
                let rims = 2.0 * PI * (outer_radius * outer_radius - inner_radius * inner_radius);
                match pick_weighted(rng, &[outer, inner, rims]) {
                    0 => {
                        let (x, z) = random_circle_point(rng, outer_radius);
                        Vec3::new(x, rng.random_range(-h..=h), z)
                    }
                    1 => {
                        let (x, z) = random_circle_point(rng, inner_radius);
                        Vec3::new(x, rng.random_range(-h..=h), z)
                    }
                    _ => {
                        let (x, z) = random_disc_point(rng, inner_radius, outer_radius);
                        let y = if rng.random_bool(0.5) { h } else { -h };
                        Vec3::new(x, y, z)
                    }
                }
            }
        }
    }
}

/// Index chosen with probability proportional to its weight
fn pick_weighted<R: Rng + ?Sized>(rng: &mut R, weights: &[f32]) -> usize {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return 0;
    }
    let mut roll = rng.random_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        if roll < *w {
            return i;
        }
        roll -= w;
    }
    weights.len() - 1
}

/// Uniform direction on the unit sphere
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

fn random_circle_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> (f32, f32) {
    let theta = rng.random_range(0.0..TAU);
    (radius * theta.cos(), radius * theta.sin())
}

/// Uniform point in an annulus (a disc when `inner` is zero)
fn random_disc_point<R: Rng + ?Sized>(rng: &mut R, inner: f32, outer: f32) -> (f32, f32) {
    let r2 = rng.random_range(inner * inner..=outer * outer);
    random_circle_point(rng, r2.sqrt())
}

fn sample_triangle<R: Rng + ?Sized>(rng: &mut R, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let mut u: f32 = rng.random();
    let mut v: f32 = rng.random();
    if u + v > 1.0 {
        u = 1.0 - u;
        v = 1.0 - v;
    }
    a + (b - a) * u + (c - a) * v
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_kind_is_uniform() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut counts = [0u32; 8];
        let draws = 80_000;
        for _ in 0..draws {
            counts[ShapeKind::random(&mut rng).index() as usize] += 1;
        }
        let expected = draws as f32 / 8.0;
        for (i, c) in counts.iter().enumerate() {
            let deviation = (*c as f32 - expected).abs() / expected;
            assert!(deviation < 0.05, "kind {} drawn {} times", i, c);
        }
    }

    #[test]
    fn test_index_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(ShapeKind::from_index(8), None);
    }

    #[test]
    fn test_geometry_dimensions() {
        assert_eq!(
            ShapeKind::Capsule.geometry(),
            ShapeGeometry::Capsule {
                cap_radius: 0.3,
                height: 2.5
            }
        );
        assert_eq!(
            ShapeKind::Tube.geometry(),
            ShapeGeometry::Tube {
                inner_radius: 0.25,
                outer_radius: 0.5,
                height: 1.0
            }
        );
    }

    #[test]
    fn test_surface_samples_lie_on_surface() {
        let mut rng = Pcg32::seed_from_u64(42);
        for kind in ShapeKind::ALL {
            let geometry = kind.geometry();
            for _ in 0..200 {
                let p = geometry.sample_surface(&mut rng);
                let d = geometry.sdf(p);
                assert!(d.abs() < 0.02, "{} sample {:?} at distance {}", kind.name(), p, d);
            }
        }
    }

    #[test]
    fn test_bounding_radius_encloses_samples() {
        let mut rng = Pcg32::seed_from_u64(3);
        for kind in ShapeKind::ALL {
            let geometry = kind.geometry();
            let radius = geometry.bounding_radius();
            for _ in 0..200 {
                let p = geometry.sample_surface(&mut rng);
                assert!(p.length() <= radius + 1e-4, "{} escapes its bounds", kind.name());
            }
        }
    }

    proptest! {
        #[test]
        fn random_kind_always_valid(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let kind = ShapeKind::random(&mut rng);
            prop_assert!(kind.index() < 8);
            prop_assert_eq!(ShapeKind::from_index(kind.index()), Some(kind));
        }
    }
}

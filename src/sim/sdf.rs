//! Signed distance fields for the shape primitives
//!
//! All primitives are in node-local space, centered like their scene
//! counterparts: the pyramid sits on its base at y = 0, everything else is
//! centered on the origin with its axis along +Y. The same functions are
//! mirrored in `renderer/sdf_shader.wgsl`.

use glam::{Vec2, Vec3};

/// Signed distance to a sphere
#[inline]
pub fn sd_sphere(p: Vec3, radius: f32) -> f32 {
    p.length() - radius
}

/// Signed distance to an axis-aligned box given its half extents
#[inline]
pub fn sd_box(p: Vec3, half: Vec3) -> f32 {
    let q = p.abs() - half;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}

/// Signed distance to a rectangular pyramid with its base on y = 0.
///
/// Max of the face planes: exact inside, a lower bound outside, which is
/// all sphere tracing needs.
pub fn sd_pyramid(p: Vec3, width: f32, height: f32, length: f32) -> f32 {
    let hx = width * 0.5;
    let hz = length * 0.5;
    let base = -p.y;

    // Side planes through the base edge and the apex
    let nx = Vec2::new(height, hx).normalize_or_zero();
    let side_x = nx.x * p.x.abs() + nx.y * p.y - nx.x * hx;
    let nz = Vec2::new(height, hz).normalize_or_zero();
    let side_z = nz.x * p.z.abs() + nz.y * p.y - nz.x * hz;

    base.max(side_x).max(side_z)
}

/// Signed distance to a torus lying in the XZ plane
#[inline]
pub fn sd_torus(p: Vec3, ring_radius: f32, pipe_radius: f32) -> f32 {
    let q = Vec2::new(Vec2::new(p.x, p.z).length() - ring_radius, p.y);
    q.length() - pipe_radius
}

/// Signed distance to a vertical capsule; `height` includes both caps
pub fn sd_capsule(p: Vec3, cap_radius: f32, height: f32) -> f32 {
    let half = (height * 0.5 - cap_radius).max(0.0);
    let y = p.y - p.y.clamp(-half, half);
    Vec3::new(p.x, y, p.z).length() - cap_radius
}

/// Distance for a 2D profile (radial, vertical) revolved around Y
#[inline]
fn revolved(d: Vec2) -> f32 {
    d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length()
}

/// Signed distance to a capped vertical cylinder
pub fn sd_cylinder(p: Vec3, radius: f32, height: f32) -> f32 {
    let d = Vec2::new(Vec2::new(p.x, p.z).length() - radius, p.y.abs() - height * 0.5);
    revolved(d)
}

/// Signed distance to a capped cone (frustum), bottom radius at -height/2
pub fn sd_cone(p: Vec3, top_radius: f32, bottom_radius: f32, height: f32) -> f32 {
    let h = height * 0.5;
    let q = Vec2::new(Vec2::new(p.x, p.z).length(), p.y);
    let k1 = Vec2::new(top_radius, h);
    let k2 = Vec2::new(top_radius - bottom_radius, 2.0 * h);
    let cap_r = if q.y < 0.0 { bottom_radius } else { top_radius };
    let ca = Vec2::new(q.x - q.x.min(cap_r), q.y.abs() - h);
    let cb = q - k1 + k2 * ((k1 - q).dot(k2) / k2.length_squared()).clamp(0.0, 1.0);
    let s = if cb.x < 0.0 && ca.y < 0.0 { -1.0 } else { 1.0 };
    s * ca.length_squared().min(cb.length_squared()).sqrt()
}

/// Signed distance to a hollow tube (annular cylinder)
pub fn sd_tube(p: Vec3, inner_radius: f32, outer_radius: f32, height: f32) -> f32 {
    let mid = (inner_radius + outer_radius) * 0.5;
    let half_wall = (outer_radius - inner_radius) * 0.5;
    let r = Vec2::new(p.x, p.z).length();
    let d = Vec2::new((r - mid).abs() - half_wall, p.y.abs() - height * 0.5);
    revolved(d)
}

/// Compute SDF gradient (surface normal) using central differences
pub fn sdf_gradient<F>(p: Vec3, sdf: F) -> Vec3
where
    F: Fn(Vec3) -> f32,
{
    let eps = 1e-3;
    let dx = sdf(p + Vec3::X * eps) - sdf(p - Vec3::X * eps);
    let dy = sdf(p + Vec3::Y * eps) - sdf(p - Vec3::Y * eps);
    let dz = sdf(p + Vec3::Z * eps) - sdf(p - Vec3::Z * eps);
    Vec3::new(dx, dy, dz).normalize_or_zero()
}

/// Sphere-trace a ray against an SDF.
///
/// `dir` must be normalized. Returns the distance along the ray of the
/// first surface hit within `max_dist`.
pub fn raymarch<F>(origin: Vec3, dir: Vec3, max_dist: f32, max_steps: usize, sdf: F) -> Option<f32>
where
    F: Fn(Vec3) -> f32,
{
    const HIT_EPSILON: f32 = 1e-3;

    let mut t = 0.0;
    for _ in 0..max_steps {
        let d = sdf(origin + dir * t);
        if d < HIT_EPSILON {
            return Some(t);
        }
        t += d;
        if t >= max_dist {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_and_box_signs() {
        assert!(sd_sphere(Vec3::ZERO, 0.5) < 0.0);
        assert!((sd_sphere(Vec3::new(2.0, 0.0, 0.0), 0.5) - 1.5).abs() < 1e-6);

        let half = Vec3::splat(0.5);
        assert!(sd_box(Vec3::ZERO, half) < 0.0);
        assert!((sd_box(Vec3::new(1.5, 0.0, 0.0), half) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pyramid_base_and_apex() {
        // Just above the base center is inside
        assert!(sd_pyramid(Vec3::new(0.0, 0.1, 0.0), 1.0, 1.0, 1.0) < 0.0);
        // Below the base is outside
        assert!(sd_pyramid(Vec3::new(0.0, -0.5, 0.0), 1.0, 1.0, 1.0) > 0.0);
        // Above the apex is outside
        assert!(sd_pyramid(Vec3::new(0.0, 1.5, 0.0), 1.0, 1.0, 1.0) > 0.0);
    }

    #[test]
    fn test_torus_hole_is_empty() {
        assert!(sd_torus(Vec3::ZERO, 0.5, 0.25) > 0.0);
        assert!(sd_torus(Vec3::new(0.5, 0.0, 0.0), 0.5, 0.25) < 0.0);
    }

    #[test]
    fn test_capsule_cylinder_extent() {
        assert!(sd_capsule(Vec3::new(0.0, 1.2, 0.0), 0.3, 2.5) < 0.0);
        assert!(sd_capsule(Vec3::new(0.0, 1.3, 0.0), 0.3, 2.5) > 0.0);
        assert!(sd_cylinder(Vec3::new(0.0, 1.2, 0.0), 0.3, 2.5) < 0.0);
        assert!(sd_cylinder(Vec3::new(0.4, 0.0, 0.0), 0.3, 2.5) > 0.0);
    }

    #[test]
    fn test_cone_is_wider_at_bottom() {
        // Radius 0.4 fits near the bottom but not near the top
        assert!(sd_cone(Vec3::new(0.4, -0.45, 0.0), 0.25, 0.5, 1.0) < 0.0);
        assert!(sd_cone(Vec3::new(0.4, 0.45, 0.0), 0.25, 0.5, 1.0) > 0.0);
    }

    #[test]
    fn test_tube_is_hollow() {
        assert!(sd_tube(Vec3::ZERO, 0.25, 0.5, 1.0) > 0.0);
        assert!(sd_tube(Vec3::new(0.375, 0.0, 0.0), 0.25, 0.5, 1.0) < 0.0);
    }

    #[test]
    fn test_gradient_points_outward() {
        let n = sdf_gradient(Vec3::new(1.0, 0.0, 0.0), |p| sd_sphere(p, 0.5));
        assert!((n - Vec3::X).length() < 1e-3);
    }

    #[test]
    fn test_raymarch_hits_sphere_front() {
        let t = raymarch(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 20.0, 64, |p| {
            sd_sphere(p, 0.5)
        });
        let t = t.expect("ray should hit");
        assert!((t - 4.5).abs() < 1e-2);
    }

    #[test]
    fn test_raymarch_misses() {
        let t = raymarch(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z, 20.0, 64, |p| {
            sd_sphere(p, 0.5)
        });
        assert!(t.is_none());
    }
}

//! Hit-testing taps against shapes
//!
//! Each candidate is first checked against its bounding sphere, then the
//! ray is moved into node-local space and sphere-traced against the exact
//! primitive.

use glam::Vec3;

use super::camera::Ray;
use super::sdf::raymarch;
use super::state::Shape;

const MAX_MARCH_STEPS: usize = 96;

/// A shape under the ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub id: u32,
    /// Distance along the ray
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Entry and exit distances of a ray through a sphere
fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, f32)> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let exit = -b + root;
    if exit < 0.0 {
        return None;
    }
    Some(((-b - root).max(0.0), exit))
}

/// Test a single shape
pub fn hit_shape(ray: &Ray, shape: &Shape) -> Option<HitResult> {
    let (enter, exit) = ray_sphere(ray, shape.body.position, shape.body.radius)?;

    let inv_rot = shape.body.rotation.inverse();
    let origin = shape.body.to_local(ray.at(enter));
    let dir = inv_rot * ray.dir;
    let geometry = shape.geometry;

    let t = raymarch(origin, dir, exit - enter, MAX_MARCH_STEPS, |p| geometry.sdf(p))?;
    let distance = enter + t;
    Some(HitResult {
        id: shape.id,
        distance,
        point: ray.at(distance),
    })
}

/// All shapes under the ray, nearest first
pub fn hit_test(ray: &Ray, shapes: &[Shape]) -> Vec<HitResult> {
    let mut hits: Vec<HitResult> = shapes.iter().filter_map(|s| hit_shape(ray, s)).collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::color::ShapeColor;
    use crate::sim::shape::ShapeKind;
    use glam::Quat;

    fn ray_down_z(x: f32, y: f32) -> Ray {
        Ray {
            origin: Vec3::new(x, y, 10.0),
            dir: Vec3::NEG_Z,
        }
    }

    #[test]
    fn test_hits_sphere() {
        let shape = Shape::new(1, ShapeKind::Sphere, ShapeColor::Red, Vec3::new(0.0, 3.0, 0.0));
        let hit = hit_shape(&ray_down_z(0.0, 3.0), &shape).expect("should hit");
        assert_eq!(hit.id, 1);
        assert!((hit.distance - 9.5).abs() < 1e-2);
    }

    #[test]
    fn test_torus_hole_misses_when_facing_camera() {
        // Ring turned to face +Z so the ray passes through the hole
        let mut shape = Shape::new(1, ShapeKind::Torus, ShapeColor::Red, Vec3::ZERO);
        shape.body.rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        assert!(hit_shape(&ray_down_z(0.0, 0.0), &shape).is_none());
        assert!(hit_shape(&ray_down_z(0.5, 0.0), &shape).is_some());
    }

    #[test]
    fn test_rotation_matters_for_long_shapes() {
        // A cylinder 2.5 tall is hit 1.0 above its center when upright...
        let mut shape = Shape::new(1, ShapeKind::Cylinder, ShapeColor::Red, Vec3::ZERO);
        assert!(hit_shape(&ray_down_z(0.0, 1.0), &shape).is_some());
        // ...but not once it is lying on its side
        shape.body.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        assert!(hit_shape(&ray_down_z(0.0, 1.0), &shape).is_none());
        assert!(hit_shape(&ray_down_z(1.0, 0.0), &shape).is_some());
    }

    #[test]
    fn test_nearest_first() {
        let far = Shape::new(1, ShapeKind::Box, ShapeColor::Red, Vec3::new(0.0, 0.0, -3.0));
        let near = Shape::new(2, ShapeKind::Box, ShapeColor::Black, Vec3::new(0.0, 0.0, 2.0));
        let hits = hit_test(&ray_down_z(0.0, 0.0), &[far, near]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 2);
        assert_eq!(hits[1].id, 1);
    }

    #[test]
    fn test_shape_behind_ray_is_ignored() {
        let shape = Shape::new(1, ShapeKind::Sphere, ShapeColor::Red, Vec3::new(0.0, 0.0, 20.0));
        assert!(hit_shape(&ray_down_z(0.0, 0.0), &shape).is_none());
    }
}

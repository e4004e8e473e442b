//! Scene camera and screen-space picking

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::consts::*;

/// A ray in world space (`dir` is normalized)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Perspective camera looking down -Z with +Y up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: CAMERA_POSITION,
            fov_y: CAMERA_FOV_Y_DEGREES.to_radians(),
            z_near: CAMERA_Z_NEAR,
            z_far: CAMERA_Z_FAR,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), self.z_near, self.z_far)
    }

    /// Ray through a screen point (pixels, origin top-left)
    pub fn ray_from_screen(&self, point: Vec2, viewport: Vec2) -> Ray {
        let viewport = viewport.max(Vec2::ONE);
        let aspect = viewport.x / viewport.y;
        let ndc = Vec2::new(
            point.x / viewport.x * 2.0 - 1.0,
            1.0 - point.y / viewport.y * 2.0,
        );
        let half_h = (self.fov_y * 0.5).tan();
        let dir = Vec3::new(ndc.x * half_h * aspect, ndc.y * half_h, -1.0).normalize();
        Ray {
            origin: self.position,
            dir,
        }
    }

    /// Screen point (pixels, origin top-left) of a world position, or
    /// `None` when it is behind the camera.
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        let viewport = viewport.max(Vec2::ONE);
        let clip = self.projection(viewport.x / viewport.y) * self.view() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_looks_forward() {
        let camera = Camera::default();
        let viewport = Vec2::new(800.0, 600.0);
        let ray = camera.ray_from_screen(viewport * 0.5, viewport);
        assert_eq!(ray.origin, CAMERA_POSITION);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_top_of_screen_looks_up() {
        let camera = Camera::default();
        let viewport = Vec2::new(800.0, 600.0);
        let ray = camera.ray_from_screen(Vec2::new(400.0, 0.0), viewport);
        assert!(ray.dir.y > 0.0);
        // Top edge is half the vertical FOV above the axis
        let angle = ray.dir.y.atan2(-ray.dir.z);
        assert!((angle - camera.fov_y * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_project_inverts_ray() {
        let camera = Camera::default();
        let viewport = Vec2::new(1024.0, 768.0);
        let screen = Vec2::new(300.0, 500.0);
        let ray = camera.ray_from_screen(screen, viewport);
        let projected = camera
            .project(ray.at(7.0), viewport)
            .expect("point is in front of the camera");
        assert!((projected - screen).length() < 0.05);
    }

    #[test]
    fn test_project_behind_camera() {
        let camera = Camera::default();
        let behind = CAMERA_POSITION + Vec3::Z * 5.0;
        assert!(camera.project(behind, Vec2::new(640.0, 480.0)).is_none());
    }
}

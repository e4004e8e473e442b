//! Dynamic rigid bodies
//!
//! Just enough physics for shapes that get flung up and fall back down:
//! gravity, off-center impulses that make them tumble, damping, and
//! bounding-sphere contacts so they knock into each other.

use glam::{Quat, Vec3};

use crate::consts::*;

/// A dynamic body with a bounding sphere
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    /// Scalar moment of inertia (solid sphere approximation)
    pub inertia: f32,
    /// Contact radius
    pub radius: f32,
}

impl RigidBody {
    /// Body at rest at `position` with the given contact radius
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: BODY_MASS,
            inertia: (0.4 * BODY_MASS * radius * radius).max(1e-4),
            radius,
        }
    }

    /// Apply an instantaneous impulse at an offset from the center of mass
    pub fn apply_impulse(&mut self, impulse: Vec3, at: Vec3) {
        self.velocity += impulse / self.mass;
        self.angular_velocity += at.cross(impulse) / self.inertia;
    }

    /// Advance by `dt` seconds (semi-implicit Euler)
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += GRAVITY * dt;
        self.velocity *= (1.0 - LINEAR_DAMPING).powf(dt);
        self.angular_velocity *= (1.0 - ANGULAR_DAMPING).powf(dt);

        self.position += self.velocity * dt;

        let spin = self.angular_velocity * dt;
        if spin.length_squared() > 0.0 {
            self.rotation = (Quat::from_scaled_axis(spin) * self.rotation).normalize();
        }
    }

    /// Node-local point from a world-space one
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }
}

impl AsMut<RigidBody> for RigidBody {
    fn as_mut(&mut self) -> &mut RigidBody {
        self
    }
}

/// Separate overlapping bodies and bounce them apart
pub fn resolve_contacts<T: AsMut<RigidBody>>(items: &mut [T]) {
    for i in 0..items.len() {
        let (head, tail) = items.split_at_mut(i + 1);
        let a = head[i].as_mut();
        for other in tail.iter_mut() {
            resolve_pair(a, other.as_mut());
        }
    }
}

fn resolve_pair(a: &mut RigidBody, b: &mut RigidBody) {
    let delta = b.position - a.position;
    let min_dist = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return;
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: push apart vertically
    let normal = if dist > 1e-5 { delta / dist } else { Vec3::Y };
    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;
    let inv_sum = inv_a + inv_b;

    // Positional correction split by inverse mass
    let penetration = min_dist - dist;
    a.position -= normal * penetration * (inv_a / inv_sum);
    b.position += normal * penetration * (inv_b / inv_sum);

    // Only bounce if approaching
    let approach = (b.velocity - a.velocity).dot(normal);
    if approach < 0.0 {
        let j = -(1.0 + RESTITUTION) * approach / inv_sum;
        a.velocity -= normal * j * inv_a;
        b.velocity += normal * j * inv_b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_sets_velocity_and_spin() {
        let mut body = RigidBody::new(Vec3::ZERO, 0.5);
        body.apply_impulse(Vec3::new(1.0, 14.0, 0.0), SPAWN_IMPULSE_OFFSET);
        assert!((body.velocity - Vec3::new(1.0, 14.0, 0.0)).length() < 1e-6);
        assert!(body.angular_velocity.length() > 0.0);
    }

    #[test]
    fn test_centered_impulse_does_not_spin() {
        let mut body = RigidBody::new(Vec3::ZERO, 0.5);
        body.apply_impulse(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert_eq!(body.angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_body_rises_then_falls() {
        let mut body = RigidBody::new(Vec3::ZERO, 0.5);
        body.apply_impulse(Vec3::new(0.0, 14.0, 0.0), Vec3::ZERO);

        let mut peak = 0.0_f32;
        for _ in 0..60 {
            body.integrate(SIM_DT);
            peak = peak.max(body.position.y);
        }
        assert!(peak > 5.0);

        for _ in 0..240 {
            body.integrate(SIM_DT);
        }
        assert!(body.position.y < CLEANUP_Y);
    }

    #[test]
    fn test_rotation_stays_normalized() {
        let mut body = RigidBody::new(Vec3::ZERO, 0.5);
        body.angular_velocity = Vec3::new(3.0, -2.0, 5.0);
        for _ in 0..500 {
            body.integrate(SIM_DT);
        }
        assert!((body.rotation.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_to_local_undoes_placement() {
        let mut body = RigidBody::new(Vec3::new(1.0, 2.0, 3.0), 0.5);
        body.rotation = Quat::from_rotation_y(0.7);
        let p = Vec3::new(0.3, -0.2, 0.9);
        assert!((body.to_local(body.position + body.rotation * p) - p).length() < 1e-5);
    }

    #[test]
    fn test_contacts_separate_and_bounce() {
        let mut a = RigidBody::new(Vec3::ZERO, 0.5);
        let mut b = RigidBody::new(Vec3::new(0.6, 0.0, 0.0), 0.5);
        a.velocity = Vec3::new(1.0, 0.0, 0.0);
        b.velocity = Vec3::new(-1.0, 0.0, 0.0);

        let mut bodies = [a, b];
        resolve_contacts(&mut bodies);

        let dist = (bodies[1].position - bodies[0].position).length();
        assert!(dist >= 1.0 - 1e-5);
        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
    }

    #[test]
    fn test_contacts_ignore_separated_bodies() {
        let a = RigidBody::new(Vec3::ZERO, 0.5);
        let b = RigidBody::new(Vec3::new(3.0, 0.0, 0.0), 0.5);
        let mut bodies = [a.clone(), b.clone()];
        resolve_contacts(&mut bodies);
        assert_eq!(bodies[0], a);
        assert_eq!(bodies[1], b);
    }
}

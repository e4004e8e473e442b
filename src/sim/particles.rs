//! Particle effects: trails that follow shapes and explosions when tapped
//!
//! Particles are visual only and never feed back into gameplay.

use glam::{Mat4, Vec3};
use rand::Rng;

use super::physics::RigidBody;
use super::sdf::sdf_gradient;
use super::shape::{ShapeGeometry, random_unit_vector};
use crate::consts::GRAVITY;

/// Maximum live particles in the scene
pub const MAX_PARTICLES: usize = 1024;

/// A single particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec3,
    pub vel: Vec3,
    pub color: [f32; 4],
    /// 1 at birth, 0 at death
    pub life: f32,
    /// Life lost per second
    pub decay: f32,
    pub size: f32,
    pub gravity_scale: f32,
    pub drag: f32,
}

/// Emission parameters for one kind of effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePreset {
    /// Particles per second for continuous emitters
    pub birth_rate: f32,
    /// Particles per one-shot burst
    pub burst: u32,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    /// Speed along the surface normal at birth
    pub speed_min: f32,
    pub speed_max: f32,
    /// Random velocity added in any direction
    pub jitter: f32,
    pub size: f32,
    pub gravity_scale: f32,
    /// Fraction of velocity kept per second
    pub drag: f32,
}

/// Thin fading streak left behind a flying shape
pub const TRAIL: ParticlePreset = ParticlePreset {
    birth_rate: 45.0,
    burst: 0,
    lifetime_min: 0.3,
    lifetime_max: 0.5,
    speed_min: 0.0,
    speed_max: 0.1,
    jitter: 0.05,
    size: 0.09,
    gravity_scale: 0.0,
    drag: 0.2,
};

/// Burst of debris from the surface of a tapped shape
pub const EXPLOSION: ParticlePreset = ParticlePreset {
    birth_rate: 0.0,
    burst: 160,
    lifetime_min: 0.5,
    lifetime_max: 1.1,
    speed_min: 2.0,
    speed_max: 5.0,
    jitter: 0.8,
    size: 0.12,
    gravity_scale: 0.4,
    drag: 0.3,
};

impl ParticlePreset {
    /// Build one particle at a world-space surface point
    fn particle<R: Rng + ?Sized>(&self, rng: &mut R, pos: Vec3, normal: Vec3, color: [f32; 4]) -> Particle {
        let speed = rng.random_range(self.speed_min..=self.speed_max);
        let lifetime = rng.random_range(self.lifetime_min..=self.lifetime_max);
        Particle {
            pos,
            vel: normal * speed + random_unit_vector(rng) * self.jitter,
            color,
            life: 1.0,
            decay: 1.0 / lifetime.max(1e-3),
            size: self.size,
            gravity_scale: self.gravity_scale,
            drag: self.drag,
        }
    }
}

/// World-space surface point and outward normal of a node
fn surface_point<R: Rng + ?Sized>(rng: &mut R, geometry: &ShapeGeometry, transform: &Mat4) -> (Vec3, Vec3) {
    let local = geometry.sample_surface(rng);
    let normal = sdf_gradient(local, |p| geometry.sdf(p));
    (
        transform.transform_point3(local),
        transform.transform_vector3(normal).normalize_or_zero(),
    )
}

/// Continuous emitter attached to a spawned shape
#[derive(Debug, Clone, PartialEq)]
pub struct TrailEmitter {
    pub color: [f32; 4],
    accumulator: f32,
}

impl TrailEmitter {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            accumulator: 0.0,
        }
    }

    /// Emit this tick's share of particles from the body's surface
    pub fn emit<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        dt: f32,
        body: &RigidBody,
        geometry: &ShapeGeometry,
        particles: &mut Vec<Particle>,
    ) {
        self.accumulator += TRAIL.birth_rate * dt;
        let transform = crate::node_transform(body.position, body.rotation);
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            if particles.len() >= MAX_PARTICLES {
                continue;
            }
            let (pos, normal) = surface_point(rng, geometry, &transform);
            particles.push(TRAIL.particle(rng, pos, normal, self.color));
        }
    }
}

/// One-shot explosion emitted from the surface of `geometry` placed at
/// `transform`. Returns the number of particles spawned.
pub fn spawn_explosion<R: Rng + ?Sized>(
    rng: &mut R,
    geometry: &ShapeGeometry,
    transform: Mat4,
    color: [f32; 4],
    particles: &mut Vec<Particle>,
) -> usize {
    let room = MAX_PARTICLES.saturating_sub(particles.len());
    let count = (EXPLOSION.burst as usize).min(room);
    for _ in 0..count {
        let (pos, normal) = surface_point(rng, geometry, &transform);
        particles.push(EXPLOSION.particle(rng, pos, normal, color));
    }
    count
}

/// Advance all particles and drop the dead ones
pub fn update_particles(particles: &mut Vec<Particle>, dt: f32) {
    for p in particles.iter_mut() {
        p.vel += GRAVITY * p.gravity_scale * dt;
        p.vel *= p.drag.powf(dt);
        p.pos += p.vel * dt;
        p.life -= p.decay * dt;
    }
    particles.retain(|p| p.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::shape::ShapeKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_explosion_surrounds_node() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut particles = Vec::new();
        let geometry = ShapeKind::Sphere.geometry();
        let center = Vec3::new(1.0, 4.0, 0.0);
        let transform = crate::node_transform(center, glam::Quat::IDENTITY);

        let count = spawn_explosion(&mut rng, &geometry, transform, [1.0; 4], &mut particles);
        assert_eq!(count, EXPLOSION.burst as usize);
        for p in &particles {
            assert!(((p.pos - center).length() - 0.5).abs() < 1e-3);
            // Debris flies outward
            assert!(p.vel.dot(p.pos - center) > 0.0);
        }
    }

    #[test]
    fn test_explosion_respects_cap() {
        let mut rng = Pcg32::seed_from_u64(2);
        let geometry = ShapeKind::Box.geometry();
        let template = EXPLOSION.particle(&mut rng, Vec3::ZERO, Vec3::Y, [1.0; 4]);
        let mut particles = vec![template; MAX_PARTICLES - 10];
        let count = spawn_explosion(&mut rng, &geometry, Mat4::IDENTITY, [1.0; 4], &mut particles);
        assert_eq!(count, 10);
        assert_eq!(particles.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_trail_rate() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut particles = Vec::new();
        let geometry = ShapeKind::Torus.geometry();
        let body = RigidBody::new(Vec3::ZERO, geometry.bounding_radius());
        let mut trail = TrailEmitter::new([0.0, 1.0, 0.0, 1.0]);

        for _ in 0..60 {
            trail.emit(&mut rng, SIM_DT, &body, &geometry, &mut particles);
        }
        let expected = TRAIL.birth_rate as usize;
        assert!(particles.len().abs_diff(expected) <= 1);
        assert!(particles.iter().all(|p| p.color == [0.0, 1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_particles_expire() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut particles = Vec::new();
        let geometry = ShapeKind::Cone.geometry();
        spawn_explosion(&mut rng, &geometry, Mat4::IDENTITY, [1.0; 4], &mut particles);
        assert!(!particles.is_empty());

        // Longer than the longest lifetime
        for _ in 0..((EXPLOSION.lifetime_max / SIM_DT) as usize + 2) {
            update_particles(&mut particles, SIM_DT);
        }
        assert!(particles.is_empty());
    }
}

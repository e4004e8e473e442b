//! Geometry Fighter - tap the flying shapes, avoid the black ones
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, physics, hit-testing, scoring)
//! - `renderer`: WebGPU SDF raymarching pipeline
//! - `platform`: Browser/native platform abstraction
//! - `settings`, `highscores`: Preferences and leaderboard

pub mod audio;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};

use glam::{Mat4, Quat, Vec3};

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz, one step per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World gravity (scene units/s²)
    pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);
    /// Mass of every spawned body
    pub const BODY_MASS: f32 = 1.0;
    /// Fraction of linear velocity lost per second
    pub const LINEAR_DAMPING: f32 = 0.1;
    /// Fraction of angular velocity lost per second
    pub const ANGULAR_DAMPING: f32 = 0.1;
    /// Bounciness of body/body contacts
    pub const RESTITUTION: f32 = 0.5;

    /// Seconds between spawns, re-rolled after every spawn
    pub const SPAWN_INTERVAL_MIN: f32 = 0.2;
    pub const SPAWN_INTERVAL_MAX: f32 = 1.5;
    /// Launch impulse ranges
    pub const SPAWN_IMPULSE_X_MIN: f32 = -2.0;
    pub const SPAWN_IMPULSE_X_MAX: f32 = 2.0;
    pub const SPAWN_IMPULSE_Y_MIN: f32 = 10.0;
    pub const SPAWN_IMPULSE_Y_MAX: f32 = 18.0;
    /// Launch impulse is applied slightly off-center so shapes tumble
    pub const SPAWN_IMPULSE_OFFSET: Vec3 = Vec3::new(0.05, 0.05, 0.05);

    /// Shapes that fall below this height are removed
    pub const CLEANUP_Y: f32 = -2.0;

    /// Camera placement and projection
    pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 5.0, 10.0);
    pub const CAMERA_FOV_Y_DEGREES: f32 = 60.0;
    pub const CAMERA_Z_NEAR: f32 = 1.0;
    pub const CAMERA_Z_FAR: f32 = 100.0;

    /// HUD anchor in scene space
    pub const HUD_POSITION: Vec3 = Vec3::new(0.0, 10.0, 0.0);

    /// Lives at the start of a run
    pub const START_LIVES: u32 = 3;
}

/// World transform of a node: rotate first, then translate.
#[inline]
pub fn node_transform(position: Vec3, rotation: Quat) -> Mat4 {
    Mat4::from_rotation_translation(rotation, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_transform_rotates_then_translates() {
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let m = node_transform(Vec3::new(1.0, 2.0, 3.0), rotation);
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 3.0, 3.0)).length() < 1e-5);
    }
}

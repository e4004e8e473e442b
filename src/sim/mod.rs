//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod camera;
pub mod color;
pub mod hit;
pub mod hud;
pub mod particles;
pub mod physics;
pub mod sdf;
pub mod shape;
pub mod state;
pub mod tick;

pub use camera::{Camera, Ray};
pub use color::{ShapeColor, ShapeTag};
pub use hit::{HitResult, hit_test};
pub use hud::Hud;
pub use particles::{MAX_PARTICLES, Particle};
pub use physics::RigidBody;
pub use shape::{ShapeGeometry, ShapeKind};
pub use state::{GameEvent, GamePhase, GameState, Shape};
pub use tick::{TickInput, handle_touch_for, spawn_shape, tick, touch};

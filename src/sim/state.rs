//! Game state and core simulation types

use glam::{Mat4, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::camera::Camera;
use super::color::{ShapeColor, ShapeTag};
use super::particles::{Particle, TrailEmitter};
use super::physics::RigidBody;
use super::shape::{ShapeGeometry, ShapeKind};
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Shapes spawn and can be tapped
    Playing,
    /// Game is paused
    Paused,
    /// Out of lives; the next tap starts a new run
    GameOver,
}

/// Things that happened during a tick, for audio and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A shape was launched
    Spawned { id: u32, tag: ShapeTag },
    /// A shape was tapped and blew up
    Exploded { id: u32, tag: ShapeTag },
    /// A shape fell out of view
    Removed { id: u32 },
    /// Lives ran out
    GameOver { score: u32, new_high_score: bool },
}

/// A spawned shape node
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: u32,
    pub kind: ShapeKind,
    pub geometry: ShapeGeometry,
    pub color: ShapeColor,
    pub tag: ShapeTag,
    pub body: RigidBody,
    pub trail: TrailEmitter,
}

impl Shape {
    /// New shape at rest at `position`; the tag follows from the color
    pub fn new(id: u32, kind: ShapeKind, color: ShapeColor, position: Vec3) -> Self {
        let geometry = kind.geometry();
        Self {
            id,
            kind,
            geometry,
            color,
            tag: ShapeTag::for_color(color),
            body: RigidBody::new(position, geometry.bounding_radius()),
            trail: TrailEmitter::new(color.rgba()),
        }
    }

    /// World transform as presented this frame
    pub fn transform(&self) -> Mat4 {
        crate::node_transform(self.body.position, self.body.rotation)
    }

    /// Whether the shape has dropped out of view
    pub fn is_below_cleanup(&self) -> bool {
        self.body.position.y < CLEANUP_Y
    }
}

impl AsMut<RigidBody> for Shape {
    fn as_mut(&mut self) -> &mut RigidBody {
        &mut self.body
    }
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulation clock (seconds since the run started)
    pub time: f32,
    /// Clock time after which the next shape spawns
    pub spawn_time: f32,
    pub phase: GamePhase,
    pub score: u32,
    pub lives: u32,
    /// Best score seen, carried across restarts
    pub high_score: u32,
    pub camera: Camera,
    /// Live shapes (sorted by id)
    pub shapes: Vec<Shape>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Whether flying shapes leave particle trails
    pub trails: bool,
    /// Whether trails and explosions emit particles at all
    pub effects: bool,
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            spawn_time: 0.0,
            phase: GamePhase::Playing,
            score: 0,
            lives: START_LIVES,
            high_score: 0,
            camera: Camera::default(),
            shapes: Vec::new(),
            particles: Vec::new(),
            events: Vec::new(),
            trails: true,
            effects: true,
            next_id: 1,
        }
    }

    /// Start a fresh run, keeping the high score and particle preferences
    pub fn restart(&mut self, seed: u64) {
        let high_score = self.high_score;
        let (trails, effects) = (self.trails, self.effects);
        *self = Self::new(seed);
        self.high_score = high_score;
        self.trails = trails;
        self.effects = effects;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Uniform sample in `[min, max]`
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.random_range(min..=max)
    }

    pub fn shape(&self, id: u32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Detach a shape from the scene
    pub fn remove_shape(&mut self, id: u32) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        Some(self.shapes.remove(index))
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure shapes are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.shapes.sort_by_key(|s| s.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = GameState::new(5);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.lives, START_LIVES);
        assert_eq!(state.score, 0);
        assert!(state.shapes.is_empty());
    }

    #[test]
    fn test_shape_tag_follows_color() {
        let black = Shape::new(1, ShapeKind::Box, ShapeColor::Black, Vec3::ZERO);
        assert_eq!(black.tag, ShapeTag::Bad);
        let red = Shape::new(2, ShapeKind::Box, ShapeColor::Red, Vec3::ZERO);
        assert_eq!(red.tag, ShapeTag::Good);
    }

    #[test]
    fn test_restart_keeps_high_score() {
        let mut state = GameState::new(5);
        state.score = 12;
        state.high_score = 20;
        state.lives = 0;
        state.restart(6);
        assert_eq!(state.seed, 6);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, START_LIVES);
        assert_eq!(state.high_score, 20);
    }

    #[test]
    fn test_remove_shape() {
        let mut state = GameState::new(5);
        let id = state.next_entity_id();
        state
            .shapes
            .push(Shape::new(id, ShapeKind::Sphere, ShapeColor::Blue, Vec3::ZERO));
        assert!(state.remove_shape(id).is_some());
        assert!(state.remove_shape(id).is_none());
    }
}

//! Fixed timestep simulation tick
//!
//! Per frame: maybe spawn a shape, advance bodies and particles, sweep
//! shapes that fell out of view. Taps are resolved before any of that so
//! they hit what the player saw.

use glam::{Vec2, Vec3};
use rand::RngCore;

use super::color::{ShapeColor, ShapeTag};
use super::hit::hit_test;
use super::particles::{spawn_explosion, update_particles};
use super::physics::resolve_contacts;
use super::shape::ShapeKind;
use super::state::{GameEvent, GamePhase, GameState, Shape};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap positions in pixels (origin top-left), one per touch event
    pub taps: Vec<Vec2>,
    /// Viewport size in pixels the taps refer to
    pub viewport: Vec2,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused");
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed");
            }
            GamePhase::GameOver => {}
        }
    }

    match state.phase {
        GamePhase::Paused => return,
        GamePhase::GameOver => {
            if !input.taps.is_empty() {
                let seed = state.rng.next_u64();
                state.restart(seed);
                log::info!("New run with seed: {}", state.seed);
            }
            return;
        }
        GamePhase::Playing => {}
    }

    state.time += dt;

    for &tap in &input.taps {
        touch(state, tap, input.viewport);
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    if state.time > state.spawn_time {
        spawn_shape(state);
        state.spawn_time = state.time + state.random_range(SPAWN_INTERVAL_MIN, SPAWN_INTERVAL_MAX);
    }

    // Physics
    for shape in &mut state.shapes {
        shape.body.integrate(dt);
    }
    resolve_contacts(&mut state.shapes);

    // Trails follow the bodies' new positions
    if state.effects && state.trails {
        for shape in &mut state.shapes {
            shape
                .trail
                .emit(&mut state.rng, dt, &shape.body, &shape.geometry, &mut state.particles);
        }
    }
    update_particles(&mut state.particles, dt);

    clean_scene(state);

    // Ensure deterministic ordering
    state.normalize_order();
}

/// Launch one random shape from the origin
pub fn spawn_shape(state: &mut GameState) -> u32 {
    let id = state.next_entity_id();
    let kind = ShapeKind::random(&mut state.rng);
    let color = ShapeColor::random(&mut state.rng);
    let mut shape = Shape::new(id, kind, color, Vec3::ZERO);

    let impulse = Vec3::new(
        state.random_range(SPAWN_IMPULSE_X_MIN, SPAWN_IMPULSE_X_MAX),
        state.random_range(SPAWN_IMPULSE_Y_MIN, SPAWN_IMPULSE_Y_MAX),
        0.0,
    );
    shape.body.apply_impulse(impulse, SPAWN_IMPULSE_OFFSET);

    log::debug!(
        "Spawned {} #{} ({:?}, {}) impulse {:?}",
        kind.name(),
        id,
        color,
        shape.tag.as_str(),
        impulse
    );
    state.events.push(GameEvent::Spawned { id, tag: shape.tag });
    state.shapes.push(shape);
    id
}

/// Remove every shape that has fallen below the cleanup line
pub fn clean_scene(state: &mut GameState) {
    let events = &mut state.events;
    state.shapes.retain(|shape| {
        if shape.is_below_cleanup() {
            log::debug!("Removed #{} (fell out of view)", shape.id);
            events.push(GameEvent::Removed { id: shape.id });
            false
        } else {
            true
        }
    });
}

/// Resolve a tap at a screen point. Returns the id of the shape hit.
pub fn touch(state: &mut GameState, point: Vec2, viewport: Vec2) -> Option<u32> {
    let ray = state.camera.ray_from_screen(point, viewport);
    let hit = hit_test(&ray, &state.shapes).into_iter().next()?;
    log::debug!("Tap hit #{} at {:?}", hit.id, hit.point);
    handle_touch_for(state, hit.id);
    Some(hit.id)
}

/// Apply the effect of tapping shape `id`: explode it, adjust score or
/// lives, and take it out of the scene.
pub fn handle_touch_for(state: &mut GameState, id: u32) -> Option<ShapeTag> {
    let shape = state.remove_shape(id)?;

    if state.effects {
        spawn_explosion(
            &mut state.rng,
            &shape.geometry,
            shape.transform(),
            shape.color.rgba(),
            &mut state.particles,
        );
    }

    match shape.tag {
        ShapeTag::Good => {
            state.score += 1;
        }
        ShapeTag::Bad => {
            state.lives = state.lives.saturating_sub(1);
        }
    }
    log::debug!(
        "Tapped {} #{} -> score {} lives {}",
        shape.tag.as_str(),
        id,
        state.score,
        state.lives
    );
    state.events.push(GameEvent::Exploded { id, tag: shape.tag });

    if state.lives == 0 {
        game_over(state);
    }

    Some(shape.tag)
}

fn game_over(state: &mut GameState) {
    let new_high_score = state.score > state.high_score;
    if new_high_score {
        state.high_score = state.score;
    }
    state.phase = GamePhase::GameOver;
    state.events.push(GameEvent::GameOver {
        score: state.score,
        new_high_score,
    });
    log::info!("Game over with score {}", state.score);
}

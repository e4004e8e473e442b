//! Heads-up display contents
//!
//! The HUD hangs in the scene above the launch point; hosts draw the text
//! wherever that anchor projects to.

use glam::{Vec2, Vec3};

use super::state::{GamePhase, GameState};
use crate::consts::HUD_POSITION;

/// What the HUD shows this frame
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub text: String,
    /// Scene-space anchor
    pub anchor: Vec3,
    /// Overlay message for non-playing phases
    pub banner: Option<&'static str>,
}

impl Hud {
    pub fn from_state(state: &GameState) -> Self {
        let banner = match state.phase {
            GamePhase::Playing => None,
            GamePhase::Paused => Some("Paused"),
            GamePhase::GameOver => Some("Game Over - tap to play"),
        };
        Self {
            text: format_hud(state.lives, state.score, state.high_score),
            anchor: HUD_POSITION,
            banner,
        }
    }

    /// Pixel position of the anchor for a viewport, if on screen
    pub fn screen_anchor(&self, state: &GameState, viewport: Vec2) -> Option<Vec2> {
        state.camera.project(self.anchor, viewport)
    }
}

/// The HUD line: lives, score and best score
pub fn format_hud(lives: u32, score: u32, high_score: u32) -> String {
    format!("{} \u{2764} | Score: {} | High: {}", lives, score, high_score)
}

/// Statistics overlay line
pub fn format_stats(fps: u32, nodes: usize, particles: usize) -> String {
    format!("{} fps | {} nodes | {} particles", fps, nodes, particles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hud_text() {
        assert_eq!(format_hud(3, 7, 12), "3 \u{2764} | Score: 7 | High: 12");
    }

    #[test]
    fn test_hud_tracks_state() {
        let mut state = GameState::new(1);
        state.score = 4;
        state.lives = 2;
        let hud = Hud::from_state(&state);
        assert!(hud.text.contains("Score: 4"));
        assert!(hud.text.starts_with("2 "));
        assert_eq!(hud.banner, None);

        state.phase = GamePhase::GameOver;
        assert!(Hud::from_state(&state).banner.is_some());
    }

    #[test]
    fn test_anchor_projects_above_center() {
        let state = GameState::new(1);
        let hud = Hud::from_state(&state);
        let viewport = Vec2::new(800.0, 600.0);
        let p = hud.screen_anchor(&state, viewport).expect("anchor is visible");
        assert!((p.x - 400.0).abs() < 1e-2);
        assert!(p.y < 300.0);
    }
}

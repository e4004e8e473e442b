//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Every effect is a short list of oscillator voices; only the playback
//! half touches the browser.

use crate::sim::{GameEvent, ShapeTag};

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, OscillatorType};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A colored shape launched
    SpawnGood,
    /// A black shape launched
    SpawnBad,
    /// Colored shape popped
    ExplodeGood,
    /// Black shape popped
    ExplodeBad,
    /// Last life lost
    GameOver,
    /// Game over with a new best
    HighScore,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator note with an exponential decay envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub wave: Wave,
    /// Start frequency (Hz)
    pub freq: f32,
    /// Frequency reached at the end of the decay, if it glides
    pub glide_to: Option<f32>,
    /// Seconds after the effect starts
    pub delay: f64,
    /// Peak gain before volume scaling
    pub peak: f32,
    /// Seconds to fade out
    pub decay: f64,
}

impl Voice {
    const fn note(wave: Wave, freq: f32, delay: f64, peak: f32, decay: f64) -> Self {
        Self {
            wave,
            freq,
            glide_to: None,
            delay,
            peak,
            decay,
        }
    }

    const fn glide(wave: Wave, from: f32, to: f32, peak: f32, decay: f64) -> Self {
        Self {
            wave,
            freq: from,
            glide_to: Some(to),
            delay: 0.0,
            peak,
            decay,
        }
    }

    /// Time the voice falls silent
    pub fn end(&self) -> f64 {
        self.delay + self.decay
    }
}

/// Notes spaced `step` seconds apart
fn arpeggio(wave: Wave, freqs: &[f32], step: f64, peak: f32, decay: f64) -> Vec<Voice> {
    freqs
        .iter()
        .enumerate()
        .map(|(i, &freq)| Voice::note(wave, freq, i as f64 * step, peak, decay))
        .collect()
}

impl SoundEffect {
    /// Sounds for a simulation event, played back to back
    pub fn for_event(event: &GameEvent) -> &'static [Self] {
        match *event {
            GameEvent::Spawned { tag: ShapeTag::Good, .. } => &[SoundEffect::SpawnGood],
            GameEvent::Spawned { tag: ShapeTag::Bad, .. } => &[SoundEffect::SpawnBad],
            GameEvent::Exploded { tag: ShapeTag::Good, .. } => &[SoundEffect::ExplodeGood],
            GameEvent::Exploded { tag: ShapeTag::Bad, .. } => &[SoundEffect::ExplodeBad],
            GameEvent::Removed { .. } => &[],
            GameEvent::GameOver {
                new_high_score: true,
                ..
            } => &[SoundEffect::GameOver, SoundEffect::HighScore],
            GameEvent::GameOver { .. } => &[SoundEffect::GameOver],
        }
    }

    /// Seconds until the last voice falls silent
    pub fn duration(self) -> f64 {
        self.voices().iter().map(Voice::end).fold(0.0, f64::max)
    }

    /// The oscillator voices that make up this effect
    pub fn voices(self) -> Vec<Voice> {
        match self {
            // Rising whoosh
            SoundEffect::SpawnGood => vec![Voice::glide(Wave::Triangle, 220.0, 660.0, 0.15, 0.25)],
            // Low growl
            SoundEffect::SpawnBad => vec![Voice::glide(Wave::Sawtooth, 90.0, 140.0, 0.2, 0.35)],
            // Pop plus a sparkle on top
            SoundEffect::ExplodeGood => {
                let mut voices = vec![Voice::glide(Wave::Square, 600.0, 200.0, 0.25, 0.12)];
                voices.extend(arpeggio(Wave::Sine, &[1200.0, 1600.0, 2000.0], 0.03, 0.12, 0.25));
                voices
            }
            // Boom with a crack
            SoundEffect::ExplodeBad => vec![
                Voice::glide(Wave::Sawtooth, 100.0, 30.0, 0.5, 0.5),
                Voice::note(Wave::Square, 1500.0, 0.0, 0.2, 0.1),
            ],
            SoundEffect::GameOver => {
                arpeggio(Wave::Triangle, &[400.0, 350.0, 300.0, 200.0], 0.2, 0.3, 0.3)
            }
            SoundEffect::HighScore => arpeggio(
                Wave::Sine,
                &[500.0, 600.0, 700.0, 800.0, 1000.0],
                0.08,
                0.3,
                0.2,
            ),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<Wave> for OscillatorType {
    fn from(wave: Wave) -> Self {
        match wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
            Wave::Triangle => OscillatorType::Triangle,
        }
    }
}

/// Audio manager for the game
#[cfg(target_arch = "wasm32")]
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

#[cfg(target_arch = "wasm32")]
impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play whatever sounds an event calls for, one after another
    pub fn play_event(&self, event: &GameEvent) {
        let mut offset = 0.0;
        for &effect in SoundEffect::for_event(event) {
            self.play_after(effect, offset);
            offset += effect.duration();
        }
    }

    /// Schedule a sound effect `offset` seconds from now
    fn play_after(&self, effect: SoundEffect, offset: f64) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let now = ctx.current_time() + offset;
        for voice in effect.voices() {
            if play_voice(ctx, now, vol, &voice).is_none() {
                log::debug!("Dropped a voice of {:?}", effect);
            }
        }
    }
}

/// Schedule one oscillator through its own gain node
#[cfg(target_arch = "wasm32")]
fn play_voice(ctx: &AudioContext, now: f64, vol: f32, voice: &Voice) -> Option<()> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;
    osc.set_type(voice.wave.into());
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    let start = now + voice.delay;
    let end = start + voice.decay;
    let level = gain.gain();
    level.set_value_at_time(vol * voice.peak, start).ok()?;
    level.exponential_ramp_to_value_at_time(0.01, end).ok()?;

    let pitch = osc.frequency();
    pitch.set_value_at_time(voice.freq, start).ok()?;
    if let Some(to) = voice.glide_to {
        pitch.exponential_ramp_to_value_at_time(to, end).ok()?;
    }

    osc.start_with_when(start).ok()?;
    osc.stop_with_when(end + 0.05).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SoundEffect; 6] = [
        SoundEffect::SpawnGood,
        SoundEffect::SpawnBad,
        SoundEffect::ExplodeGood,
        SoundEffect::ExplodeBad,
        SoundEffect::GameOver,
        SoundEffect::HighScore,
    ];

    #[test]
    fn test_spawn_and_explode_follow_tag() {
        let spawned = GameEvent::Spawned {
            id: 1,
            tag: ShapeTag::Bad,
        };
        assert_eq!(SoundEffect::for_event(&spawned), &[SoundEffect::SpawnBad]);

        let exploded = GameEvent::Exploded {
            id: 1,
            tag: ShapeTag::Good,
        };
        assert_eq!(SoundEffect::for_event(&exploded), &[SoundEffect::ExplodeGood]);
    }

    #[test]
    fn test_removal_is_silent() {
        assert!(SoundEffect::for_event(&GameEvent::Removed { id: 3 }).is_empty());
    }

    #[test]
    fn test_game_over_then_fanfare_on_new_best() {
        let best = GameEvent::GameOver {
            score: 12,
            new_high_score: true,
        };
        let plain = GameEvent::GameOver {
            score: 2,
            new_high_score: false,
        };
        assert_eq!(
            SoundEffect::for_event(&best),
            &[SoundEffect::GameOver, SoundEffect::HighScore]
        );
        assert_eq!(SoundEffect::for_event(&plain), &[SoundEffect::GameOver]);
        assert!(SoundEffect::GameOver.duration() > 0.5);
    }

    #[test]
    fn test_voices_are_audible_and_short() {
        for effect in ALL {
            let voices = effect.voices();
            assert!(!voices.is_empty(), "{:?} is silent", effect);
            for v in &voices {
                // Exponential ramps need positive values
                assert!(v.freq > 0.0 && v.glide_to.is_none_or(|f| f > 0.0));
                assert!(v.peak > 0.01 && v.peak <= 1.0);
                assert!(v.decay > 0.0);
                assert!(v.end() < 1.5, "{:?} rings too long", effect);
            }
        }
    }

    #[test]
    fn test_game_over_descends() {
        let freqs: Vec<f32> = SoundEffect::GameOver
            .voices()
            .iter()
            .map(|v| v.freq)
            .collect();
        assert!(freqs.windows(2).all(|w| w[1] < w[0]));
    }
}

//! Geometry Fighter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use geometry_fighter::audio::AudioManager;
    use geometry_fighter::consts::*;
    use geometry_fighter::platform;
    use geometry_fighter::renderer::SdfRenderState;
    use geometry_fighter::sim::hud::format_stats;
    use geometry_fighter::sim::{GameEvent, GamePhase, GameState, Hud, TickInput, tick};
    use geometry_fighter::{HighScores, QualityPreset, Settings};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        high_scores: HighScores,
        audio: AudioManager,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Canvas size in CSS pixels, the space taps are reported in
        viewport: Vec2,
        muted: bool,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        hud_text: String,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let high_scores = HighScores::load();
            let mut state = GameState::new(seed);
            state.high_score = high_scores.top_score();

            let mut game = Self {
                state,
                settings,
                high_scores,
                audio: AudioManager::new(),
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                viewport: Vec2::ONE,
                muted: false,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                hud_text: String::new(),
            };
            game.apply_settings();
            game
        }

        fn apply_settings(&mut self) {
            self.state.trails = self.settings.trails;
            self.state.effects = self.settings.particles;
            self.audio.set_master_volume(self.settings.master_volume);
            self.audio.set_sfx_volume(self.settings.sfx_volume);
        }

        fn tap(&mut self, x: f32, y: f32) {
            self.audio.resume();
            self.input.taps.push(Vec2::new(x, y));
            self.input.viewport = self.viewport;
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.state, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.taps.clear();
                self.input.pause = false;
            }

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // FPS over the last 60 frames
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }

            self.handle_events();
        }

        /// Route drained sim events to audio and the leaderboard
        fn handle_events(&mut self) {
            for event in self.state.drain_events() {
                self.audio.play_event(&event);
                if let GameEvent::GameOver { score, .. } = event {
                    if let Some(rank) = self.high_scores.add_score(score, platform::now_ms()) {
                        log::info!("Score {} placed #{} on the leaderboard", score, rank);
                        self.high_scores.save();
                    }
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.settings, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = Hud::from_state(&self.state);

            if let Some(el) = document.get_element_by_id("hud") {
                if hud.text != self.hud_text {
                    el.set_text_content(Some(&hud.text));
                    self.hud_text = hud.text.clone();
                }
                if let Some(pos) = hud.screen_anchor(&self.state, self.viewport) {
                    let _ = el.set_attribute(
                        "style",
                        &format!(
                            "left:{:.0}px;top:{:.0}px;transform:translate(-50%,-50%)",
                            pos.x, pos.y
                        ),
                    );
                }
            }

            if let Some(el) = document.get_element_by_id("hud-stats") {
                if self.settings.show_stats {
                    let _ = el.set_attribute("class", "");
                    el.set_text_content(Some(&format_stats(
                        self.fps,
                        self.state.shapes.len(),
                        self.state.particles.len(),
                    )));
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }

            if let Some(el) = document.get_element_by_id("banner") {
                match hud.banner {
                    Some(text) => {
                        let _ = el.set_attribute("class", "");
                        el.set_text_content(Some(text));
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }
        }

        fn set_quality(&mut self, preset: QualityPreset) {
            self.settings.apply_preset(preset);
            self.apply_settings();
            self.settings.save();
            log::info!("Quality: {}", preset.as_str());
        }
    }

    fn js_err(context: &str, e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&format!("{}: {}", context, e))
    }

    /// Size the canvas backing store to its CSS box; returns (css size, pixel size)
    fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (Vec2, (u32, u32)) {
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (
            Vec2::new(client_w as f32, client_h as f32),
            (width, height),
        )
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| js_err("logger", e))?;

        log::info!("Geometry Fighter starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;

        let (viewport, (width, height)) = fit_canvas(&window, &canvas);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow_mut().viewport = viewport;

        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| js_err("surface", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| js_err("adapter", e))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height)
            .await
            .map_err(|e| js_err("device", e))?;
        render_state.set_start_time(0.0);
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_resize(canvas.clone(), game.clone());
        setup_auto_pause(&document, game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        request_animation_frame(game);

        log::info!("Geometry Fighter running!");
        Ok(())
    }

    /// Attach an event handler for the page's lifetime
    fn listen<F>(target: &EventTarget, name: &str, handler: F)
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        if target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("Could not listen for '{}'", name);
        }
        closure.forget();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse click - one tap at the cursor
        let g = game.clone();
        listen(canvas, "mousedown", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                g.borrow_mut()
                    .tap(mouse.offset_x() as f32, mouse.offset_y() as f32);
            }
        });

        // Touch start - first touch of the set
        let g = game.clone();
        let canvas_clone = canvas.clone();
        listen(canvas, "touchstart", move |event| {
            // Suppress the emulated mousedown
            event.prevent_default();
            let Some(touch) = event
                .dyn_ref::<TouchEvent>()
                .and_then(|e| e.changed_touches().get(0))
            else {
                return;
            };
            let rect = canvas_clone.get_bounding_client_rect();
            let x = touch.client_x() as f32 - rect.left() as f32;
            let y = touch.client_y() as f32 - rect.top() as f32;
            g.borrow_mut().tap(x, y);
        });

        let Some(window) = web_sys::window() else {
            return;
        };
        listen(&window, "keydown", move |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|e| e.key()) else {
                return;
            };
            let mut g = game.borrow_mut();
            match key.as_str() {
                "Escape" | "p" | "P" => g.input.pause = true,
                "f" | "F" => {
                    g.settings.show_stats = !g.settings.show_stats;
                    g.settings.save();
                }
                "t" | "T" => {
                    g.settings.trails = !g.settings.trails;
                    g.apply_settings();
                    g.settings.save();
                    log::info!("Trails: {}", g.settings.trails);
                }
                "x" | "X" => {
                    g.settings.particles = !g.settings.particles;
                    g.apply_settings();
                    g.settings.save();
                    log::info!("Particles: {}", g.settings.particles);
                }
                "m" | "M" => {
                    g.muted = !g.muted;
                    let muted = g.muted;
                    g.audio.set_muted(muted);
                    log::info!("Muted: {}", muted);
                }
                "1" => g.set_quality(QualityPreset::Low),
                "2" => g.set_quality(QualityPreset::Medium),
                "3" => g.set_quality(QualityPreset::High),
                _ => {}
            }
        });
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let win = window.clone();
        listen(&window, "resize", move |_| {
            let (viewport, (width, height)) = fit_canvas(&win, &canvas);
            let mut g = game.borrow_mut();
            g.viewport = viewport;
            if let Some(ref mut render_state) = g.render_state {
                render_state.resize(width, height);
            }
        });
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) {
        // Visibility change (tab switch, minimize)
        let g = game.clone();
        let doc = document.clone();
        listen(document, "visibilitychange", move |_| {
            if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut g = g.borrow_mut();
                if g.state.phase == GamePhase::Playing {
                    g.input.pause = true;
                    log::info!("Auto-paused (tab hidden)");
                }
            }
        });

        let Some(window) = web_sys::window() else {
            return;
        };

        // Window blur (click outside)
        let g = game.clone();
        listen(&window, "blur", move |_| {
            let mut g = g.borrow_mut();
            if g.state.phase == GamePhase::Playing {
                g.input.pause = true;
                log::info!("Auto-paused (window blur)");
            }
            if g.settings.mute_on_blur {
                g.audio.set_muted(true);
            }
        });

        // Focus restores the user's mute choice
        listen(&window, "focus", move |_| {
            let mut g = game.borrow_mut();
            let muted = g.muted;
            g.audio.set_muted(muted);
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    let result = wasm_game::run().await;
    if let Err(ref e) = result {
        log::error!("Startup failed: {:?}", e);
    }
    result
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    log::info!("Geometry Fighter (native) - headless run with seed {}", seed);
    log::info!("The playable build targets the browser (wasm32)");

    headless::run(seed, 120.0);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted run of the simulation without a window
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use geometry_fighter::consts::SIM_DT;
    use geometry_fighter::sim::hud::format_hud;
    use geometry_fighter::sim::{GameEvent, GamePhase, GameState, ShapeTag, TickInput, tick};
    use geometry_fighter::{HighScores, platform};

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);
    /// Ticks between bot taps
    const TAP_EVERY: u32 = 15;

    #[derive(Debug, Default)]
    struct Tally {
        spawned: u32,
        popped_good: u32,
        popped_bad: u32,
        fell: u32,
        games: u32,
    }

    /// Pick a screen point over the highest good shape
    fn choose_tap(state: &GameState) -> Option<Vec2> {
        state
            .shapes
            .iter()
            .filter(|s| s.tag == ShapeTag::Good)
            .max_by(|a, b| a.body.position.y.total_cmp(&b.body.position.y))
            .and_then(|s| state.camera.project(s.body.position, VIEWPORT))
    }

    pub fn run(seed: u64, seconds: f32) {
        let mut state = GameState::new(seed);
        let mut high_scores = HighScores::new();
        let mut tally = Tally::default();
        let ticks = (seconds / SIM_DT) as u32;

        for i in 0..ticks {
            let mut input = TickInput {
                viewport: VIEWPORT,
                ..Default::default()
            };
            let tap = match state.phase {
                GamePhase::GameOver => Some(VIEWPORT * 0.5),
                _ if i % TAP_EVERY == 0 => choose_tap(&state),
                _ => None,
            };
            input.taps.extend(tap);

            tick(&mut state, &input, SIM_DT);

            for event in state.drain_events() {
                match event {
                    GameEvent::Spawned { .. } => tally.spawned += 1,
                    GameEvent::Exploded {
                        tag: ShapeTag::Good,
                        ..
                    } => tally.popped_good += 1,
                    GameEvent::Exploded { .. } => tally.popped_bad += 1,
                    GameEvent::Removed { .. } => tally.fell += 1,
                    GameEvent::GameOver { score, .. } => {
                        tally.games += 1;
                        high_scores.add_score(score, platform::now_ms());
                    }
                }
            }
        }

        log::info!("{}", format_hud(state.lives, state.score, state.high_score));
        log::info!(
            "{:.0}s simulated: {} spawned, {} good popped, {} bad popped, {} fell, {} games over",
            seconds,
            tally.spawned,
            tally.popped_good,
            tally.popped_bad,
            tally.fell,
            tally.games
        );
        log::info!(
            "Best {} across {} recorded games",
            high_scores.top_score(),
            high_scores.entries.len()
        );
    }
}

//! Gallina Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement, MouseEvent, TouchEvent,
    };

    use gallina_dash::audio::{AudioManager, MicrophoneAnalyser, SoundEffect};
    use gallina_dash::consts::*;
    use gallina_dash::flavor::{DefaultFlavor, level_flavor_or_default};
    use gallina_dash::renderer::{RenderState, boss_scene, run_scene};
    use gallina_dash::session::FrameInput;
    use gallina_dash::sim::{
        AmplitudeSource, Lifecycle, Outcome, Phase, Viewport, VoiceInput,
    };
    use gallina_dash::settings::{SettingChange, Skin};
    use gallina_dash::{ActiveRun, GameMode, RunEvent, RunObserver, Session, Settings, Tuning};

    /// Latest numbers for the HUD
    #[derive(Default)]
    struct Hud {
        score: u64,
        coins: u64,
    }

    impl RunObserver for Hud {
        fn on_score_update(&mut self, score: u64, coins: u64) {
            self.score = score;
            self.coins = coins;
        }
    }

    /// What changed during one frame, for sound effects
    #[derive(Clone, Copy, PartialEq)]
    struct Snapshot {
        grounded: bool,
        coins: u64,
        lifecycle: Lifecycle,
        player_shots: usize,
        boss_hp: u32,
        phase: Option<Phase>,
    }

    impl Snapshot {
        fn of(active: &ActiveRun) -> Self {
            match active {
                ActiveRun::Runner(run) => Self {
                    grounded: run.runner.grounded,
                    coins: run.state.coins,
                    lifecycle: run.lifecycle,
                    player_shots: 0,
                    boss_hp: 0,
                    phase: None,
                },
                ActiveRun::Boss(enc) => Self {
                    grounded: true,
                    coins: 0,
                    lifecycle: enc.lifecycle,
                    player_shots: enc.player_shots.len(),
                    boss_hp: enc.boss.hp,
                    phase: Some(enc.phase),
                },
            }
        }

        fn cues(&self, after: &Snapshot) -> Vec<SoundEffect> {
            let mut cues = Vec::new();
            if self.grounded && !after.grounded {
                cues.push(SoundEffect::Jump);
            }
            if after.coins > self.coins {
                cues.push(SoundEffect::Pickup);
            }
            if self.lifecycle == Lifecycle::Running && after.lifecycle == Lifecycle::Teleporting {
                cues.push(SoundEffect::Portal);
            }
            if after.player_shots > self.player_shots {
                cues.push(SoundEffect::Shot);
            }
            if after.boss_hp < self.boss_hp {
                cues.push(SoundEffect::BossHit);
            }
            if self.phase == Some(Phase::Combat) && after.phase == Some(Phase::Surrender) {
                cues.push(SoundEffect::Surrender);
            }
            cues
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        settings: Settings,
        render_state: Option<RenderState>,
        audio: AudioManager,
        hud: Hud,
        accumulator: f32,
        last_time: f64,
        input: FrameInput,
        viewport: Viewport,
        paused: bool,
        /// Bumped on every start so late microphone grants can be discarded
        attempt: u64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, viewport: Viewport) -> Self {
            let mut session = Session::new(Tuning::default(), seed);
            session.apply_settings(&settings);
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.master_volume);
            Self {
                session,
                settings,
                render_state: None,
                audio,
                hud: Hud::default(),
                accumulator: 0.0,
                last_time: 0.0,
                input: FrameInput::default(),
                viewport,
                paused: false,
                attempt: 0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        fn is_playing(&self) -> bool {
            self.session
                .active()
                .is_some_and(|a| !a.lifecycle().is_terminal())
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) -> Option<RunEvent> {
            let dt = dt.min(0.1);
            let mut outcome = None;

            if !self.paused {
                self.accumulator += dt;
            }

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let before = self.session.active().map(Snapshot::of);
                let input = self.input.clone();
                if let Some(event) = self.session.tick(&input, &mut self.hud) {
                    outcome = Some(event);
                }
                let after = self.session.active().map(Snapshot::of);
                if let (Some(before), Some(after)) = (before, after) {
                    for cue in before.cues(&after) {
                        self.audio.play(cue);
                    }
                }
                self.accumulator -= SIM_DT;
                substeps += 1;

                // One-shot press
                self.input.press = false;
            }

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }

            outcome
        }

        fn render(&mut self) {
            let vertices = match self.session.active() {
                Some(ActiveRun::Runner(run)) => run_scene(run, self.settings.reduced_motion),
                Some(ActiveRun::Boss(enc)) => boss_scene(enc),
                None => return,
            };
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&vertices) {
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

        /// Start a fresh attempt in `mode`
        fn start(&mut self, mode: GameMode, game: &Rc<RefCell<Game>>) {
            self.attempt += 1;
            self.session.start(mode, self.viewport);
            self.hud = Hud::default();
            self.accumulator = 0.0;
            self.input = FrameInput {
                autopilot: self.input.autopilot,
                ..Default::default()
            };
            self.paused = false;
            self.audio.resume();

            if mode == GameMode::Voice {
                request_microphone(game.clone(), self.attempt, self.session.tuning.voice.voice_threshold);
            }
            log::info!("Started {} attempt #{}", mode.as_str(), self.attempt);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            set_text(document, "#hud-score .hud-value", &self.hud.score.to_string());
            set_text(document, "#hud-coins .hud-value", &self.hud.coins.to_string());
            set_text(document, "#hud-level .hud-value", &self.session.level.to_string());
            set_text(document, "#hud-fps .hud-value", &self.fps.to_string());
            show(document, "hud-fps", self.settings.show_fps);
            show(document, "pause-menu", self.paused);

            let active = self.session.active();

            let voice = match active {
                Some(ActiveRun::Runner(run)) if run.voice.is_active() => Some(&run.voice),
                _ => None,
            };
            show(document, "voice-meter", self.settings.show_voice_meter && voice.is_some());
            if let (Some(voice), Some(el)) = (voice, document.get_element_by_id("voice-level")) {
                let pct = (voice.level() / 255.0 * 100.0).clamp(0.0, 100.0);
                let _ = el.set_attribute("style", &format!("width: {pct:.0}%"));
            }

            let boss = match active {
                Some(ActiveRun::Boss(enc)) => Some(enc),
                _ => None,
            };
            show(document, "boss-phrase", boss.is_some());
            if let Some(enc) = boss {
                set_text(document, "#boss-phrase", &enc.boss.phrase);
            }
            show(document, "choice-panel", boss.is_some_and(|enc| enc.phase == Phase::Choice));
            show(
                document,
                "teleport-banner",
                active.is_some_and(|a| a.lifecycle() == Lifecycle::Teleporting),
            );
        }

        /// Show the result screen for a finished attempt
        fn finish(&mut self, event: RunEvent, game: &Rc<RefCell<Game>>) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let (id, score, coins) = match event {
                RunEvent::GameOver { score, coins } => {
                    self.audio.play(SoundEffect::GameOver);
                    ("game-over", score, coins)
                }
                RunEvent::LevelComplete { score, coins } => ("level-complete", score, coins),
                RunEvent::Victory { score, coins } => {
                    self.audio.play(SoundEffect::Victory);
                    ("victory", score, coins)
                }
                RunEvent::ScoreUpdate { .. } => return,
            };
            set_text(&document, &format!("#{id} .final-score"), &score.to_string());
            set_text(&document, &format!("#{id} .final-coins"), &coins.to_string());
            show(&document, id, true);

            if let RunEvent::LevelComplete { .. } = event {
                // The session already advanced; flavor is for the level just cleared
                let level = self.session.level.saturating_sub(1).max(1);
                let attempt = self.attempt;
                let game = game.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let flavor = level_flavor_or_default(&DefaultFlavor, level).await;
                    if game.borrow().attempt != attempt {
                        return;
                    }
                    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                        set_text(&document, "#flavor-encouragement", &flavor.encouragement);
                        set_text(&document, "#flavor-joke", &flavor.joke);
                    }
                });
            }
        }

        /// Apply a panel edit and persist it. Skin and threshold apply from the next attempt.
        fn change_setting(&mut self, change: SettingChange) {
            self.settings.apply(change);
            self.session.apply_settings(&self.settings);
            self.audio.set_master_volume(self.settings.master_volume);
            self.settings.save();
        }

        fn resize(&mut self, viewport: Viewport, width: u32, height: u32) {
            self.viewport = viewport;
            self.session.resize(viewport);
            if let Some(render_state) = self.render_state.as_mut() {
                render_state.resize(width, height);
            }
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn hide_results(document: &Document) {
        for id in ["game-over", "level-complete", "victory", "mode-select"] {
            show(document, id, false);
        }
    }

    /// Ask for the microphone without blocking the loop
    fn request_microphone(game: Rc<RefCell<Game>>, attempt: u64, threshold: f32) {
        wasm_bindgen_futures::spawn_local(async move {
            let acquired = MicrophoneAnalyser::acquire()
                .await
                .map(|mic| Box::new(mic) as Box<dyn AmplitudeSource>);
            let mut g = game.borrow_mut();
            if g.attempt != attempt {
                // Player moved on; dropping the analyser releases the device
                log::debug!("Discarding microphone for stale attempt {attempt}");
                return;
            }
            g.session
                .attach_voice(VoiceInput::from_acquisition(acquired, threshold));
        });
    }

    /// Canvas size in CSS pixels and backbuffer pixels
    fn measure(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (Viewport, u32, u32) {
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (Viewport::new(client_w as f32, client_h as f32), width, height)
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Gallina Dash starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        show(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let (viewport, width, height) = measure(&window, &canvas);

        let seed = js_sys::Date::now() as u64;
        let settings = Settings::load();
        let game = Rc::new(RefCell::new(Game::new(seed, settings, viewport)));

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let ratio = window.device_pixel_ratio() as f32;
        let render_state = RenderState::new(surface, &adapter, width, height, ratio)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone())?;
        setup_buttons(&document, game.clone());
        setup_settings_panel(&document, game.clone())?;
        setup_auto_pause(&document, game.clone())?;
        setup_resize(&canvas, game.clone())?;

        show(&document, "hud", true);
        show(&document, "mode-select", true);

        request_animation_frame(game);

        log::info!("Gallina Dash running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        // Mouse move steers in the arena
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut().input.pointer_y = Some(event.offset_y() as f32);
            });
            canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Mouse down - jump or fire
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.input.press = true;
                g.input.pointer_y = Some(event.offset_y() as f32);
            });
            canvas.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch start/move
        for (name, press) in [("touchstart", true), ("touchmove", false)] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if press {
                    g.input.press = true;
                }
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    g.input.pointer_y = Some(touch.client_y() as f32 - rect.top() as f32);
                }
            });
            canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().ok_or("no window")?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "ArrowUp" => g.input.press = true,
                    "Escape" | "p" | "P" => {
                        if g.is_playing() {
                            g.paused = !g.paused;
                        }
                    }
                    "i" | "I" => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
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

            if let Some(event) = g.update(dt, time) {
                g.finish(event, &game);
            }
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for (id, mode) in [
            ("mode-classic", GameMode::Classic),
            ("mode-voice", GameMode::Voice),
            ("mode-boss", GameMode::Boss),
        ] {
            let game = game.clone();
            on_click(document, id, move || {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    hide_results(&document);
                }
                let handle = game.clone();
                game.borrow_mut().start(mode, &handle);
            });
        }

        // Retry the same mode
        for id in ["restart-btn", "next-level-btn"] {
            let game = game.clone();
            on_click(document, id, move || {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    hide_results(&document);
                }
                let handle = game.clone();
                let mut g = game.borrow_mut();
                let mode = g.session.mode();
                g.start(mode, &handle);
            });
        }

        for (id, outcome) in [
            ("choice-lethal", Outcome::Lethal),
            ("choice-merciful", Outcome::Merciful),
        ] {
            let game = game.clone();
            on_click(document, id, move || {
                if let Err(e) = game.borrow_mut().session.choose(outcome) {
                    log::warn!("Ignoring choice: {e}");
                }
            });
        }

        {
            let game = game.clone();
            on_click(document, "resume-btn", move || game.borrow_mut().paused = false);
        }

        on_click(document, "menu-btn", move || {
            game.borrow_mut().session.end();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                hide_results(&document);
                show(&document, "mode-select", true);
            }
        });
    }

    fn input_by_id(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    /// Listen for `change` on a panel control and map it to a settings edit
    fn on_change(
        document: &Document,
        id: &str,
        game: &Rc<RefCell<Game>>,
        read: impl Fn(&Document) -> Option<SettingChange> + 'static,
    ) -> Result<(), JsValue> {
        let Some(el) = document.get_element_by_id(id) else {
            return Ok(());
        };
        let game = game.clone();
        let document = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Some(change) = read(&document) {
                game.borrow_mut().change_setting(change);
            }
        });
        el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_settings_panel(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let settings = game.borrow().settings.clone();

        if let Some(select) = document
            .get_element_by_id("setting-skin")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        {
            for skin in Skin::ALL {
                let option = document.create_element("option")?;
                option.set_attribute("value", skin.as_str())?;
                option.set_text_content(Some(skin.name()));
                select.append_child(&option)?;
            }
            select.set_value(settings.skin.as_str());
        }

        let ranges = [
            ("setting-threshold", settings.voice_threshold),
            ("setting-volume", settings.master_volume * 100.0),
        ];
        for (id, value) in ranges {
            if let Some(input) = input_by_id(document, id) {
                input.set_value(&format!("{value:.0}"));
            }
        }
        let toggles = [
            ("setting-fps", settings.show_fps),
            ("setting-voice-meter", settings.show_voice_meter),
            ("setting-mute-blur", settings.mute_on_blur),
            ("setting-reduced-motion", settings.reduced_motion),
        ];
        for (id, on) in toggles {
            if let Some(input) = input_by_id(document, id) {
                input.set_checked(on);
            }
        }

        on_change(document, "setting-skin", &game, |d| {
            let select: HtmlSelectElement = d.get_element_by_id("setting-skin")?.dyn_into().ok()?;
            match select.value().parse::<Skin>() {
                Ok(skin) => Some(SettingChange::Skin(skin)),
                Err(e) => {
                    log::warn!("{e}");
                    None
                }
            }
        })?;
        on_change(document, "setting-threshold", &game, |d| {
            let value = input_by_id(d, "setting-threshold")?.value_as_number() as f32;
            Some(SettingChange::VoiceThreshold(value))
        })?;
        on_change(document, "setting-volume", &game, |d| {
            let value = input_by_id(d, "setting-volume")?.value_as_number() as f32;
            Some(SettingChange::MasterVolume(value / 100.0))
        })?;
        on_change(document, "setting-fps", &game, |d| {
            Some(SettingChange::ShowFps(input_by_id(d, "setting-fps")?.checked()))
        })?;
        on_change(document, "setting-voice-meter", &game, |d| {
            Some(SettingChange::ShowVoiceMeter(input_by_id(d, "setting-voice-meter")?.checked()))
        })?;
        on_change(document, "setting-mute-blur", &game, |d| {
            Some(SettingChange::MuteOnBlur(input_by_id(d, "setting-mute-blur")?.checked()))
        })?;
        on_change(document, "setting-reduced-motion", &game, |d| {
            Some(SettingChange::ReducedMotion(input_by_id(d, "setting-reduced-motion")?.checked()))
        })?;

        on_click(document, "settings-btn", || {
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                show(&document, "settings-panel", true);
            }
        });
        on_click(document, "settings-close", || {
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                show(&document, "settings-panel", false);
            }
        });

        Ok(())
    }

    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
                let mut g = game.borrow_mut();
                if hidden && g.is_playing() {
                    g.paused = true;
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.is_playing() {
                    g.paused = true;
                    log::info!("Auto-paused (window blur)");
                }
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_muted(false);
            });
            window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else { return };
            let (viewport, width, height) = measure(&window, &canvas);
            game.borrow_mut().resize(viewport, width, height);
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Gallina Dash failed to start: {e:?}");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: one autopilot attempt per mode, outcomes logged
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gallina_dash::flavor::{DefaultFlavor, level_flavor_or_default};
    use gallina_dash::sim::{MicError, Outcome, Phase, Viewport, VoiceInput};
    use gallina_dash::session::FrameInput;
    use gallina_dash::{ActiveRun, EventLog, GameMode, RunEvent, Session, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Gallina Dash (native) starting...");
    log::info!("Native mode is a headless autopilot demo - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let viewport = Viewport::new(1000.0, 800.0);
    let mut session = Session::new(tuning, seed);
    let input = FrameInput {
        autopilot: true,
        ..Default::default()
    };

    for mode in [GameMode::Classic, GameMode::Voice, GameMode::Boss] {
        session.start(mode, viewport);
        if mode == GameMode::Voice {
            let threshold = session.tuning.voice.voice_threshold;
            session.attach_voice(VoiceInput::from_acquisition(Err(MicError::Unavailable), threshold));
        }

        let mut log = EventLog::new();
        let mut outcome = None;
        for _ in 0..20_000 {
            let awaiting_choice = matches!(
                session.active(),
                Some(ActiveRun::Boss(enc)) if enc.phase == Phase::Choice
            );
            if awaiting_choice {
                let _ = session.choose(Outcome::Merciful);
            }
            outcome = session.tick(&input, &mut log);
            if outcome.is_some() {
                break;
            }
        }

        match outcome {
            Some(RunEvent::LevelComplete { score, coins }) => {
                let flavor = pollster::block_on(level_flavor_or_default(&DefaultFlavor, session.level - 1));
                println!("{}: level complete, score {score}, coins {coins}", mode.as_str());
                println!("  {} {}", flavor.encouragement, flavor.joke);
            }
            Some(event) => println!("{}: {event:?}", mode.as_str()),
            None => println!("{}: no outcome within the frame budget", mode.as_str()),
        }
        log::info!("{} score updates recorded", log.score_updates());
    }

    println!(
        "Session: level {}, best score {}, coins earned {}",
        session.level, session.best_score, session.coins_earned
    );
}

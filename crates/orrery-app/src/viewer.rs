//! Window-independent viewer state and the per-frame step around it.

use orrery_assets::TextureLoader;
use orrery_config::Config;
use orrery_debug::{DebugRequest, DebugState, PanelFieldState};
use orrery_input::{KeyBindings, KeyboardState, MouseState, ViewerCommand};
use orrery_scene::{
    AnimationDriver, DebugPanel, FrameRenderer, FrameScheduler, OrbitControls, PerspectiveCamera,
    REFERENCE_PLANETS, RenderSize, Scene, SceneContext, SolarSystem, Viewport, build_solar_system,
};
use tracing::{debug, info, warn};

use crate::frame_clock::FrameClock;

/// Everything one frame touches, minus the window and the GPU.
pub struct Viewer {
    context: SceneContext,
    system: SolarSystem,
    driver: AnimationDriver,
    controls: OrbitControls,
    panel: DebugPanel,
    loader: TextureLoader,
    bindings: KeyBindings,
    clock: FrameClock,
    /// Physical window height; pointer deltas are in the same unit.
    pointer_height: f32,
    textures_loaded: usize,
    textures_failed: usize,
    pub mouse: MouseState,
    pub keyboard: KeyboardState,
}

impl Viewer {
    /// Build the solar system and start loading its textures.
    pub fn new(config: &Config) -> Self {
        let loader = TextureLoader::new(
            config.assets.texture_dir.clone(),
            config.assets.texture_extension.clone(),
            config.assets.loader_threads,
        );

        let mut scene = Scene::new();
        let system = build_solar_system(&mut scene, &REFERENCE_PLANETS, &loader);
        info!(
            "Built solar system: {} planets, {} nodes, textures from {}",
            system.len(),
            scene.graph.len(),
            loader.dir().display()
        );

        let viewport = Viewport::new(
            config.window.width,
            config.window.height,
            1.0,
            config.render.max_pixel_ratio,
        );
        let camera = PerspectiveCamera::from_config(&config.camera, viewport.aspect());

        Self {
            context: SceneContext::new(scene, camera, viewport),
            system,
            driver: AnimationDriver::new(),
            controls: OrbitControls::from_config(&config.controls),
            panel: DebugPanel::camera_position(),
            loader,
            bindings: KeyBindings::default(),
            clock: FrameClock::new(),
            pointer_height: config.window.height as f32,
            textures_loaded: 0,
            textures_failed: 0,
            mouse: MouseState::new(),
            keyboard: KeyboardState::new(),
        }
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn system(&self) -> &SolarSystem {
        &self.system
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.context.camera
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.driver.is_paused()
    }

    /// Stop scheduling frames. The next [`Self::frame`] returns `false`.
    pub fn stop(&mut self) {
        self.driver.stop_handle().stop();
    }

    /// React to a new window size given in physical pixels.
    pub fn resize(
        &mut self,
        physical_width: u32,
        physical_height: u32,
        scale_factor: f64,
    ) -> RenderSize {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let logical = |v: u32| (v as f64 / scale).round() as u32;
        self.pointer_height = physical_height.max(1) as f32;
        self.context
            .resize(logical(physical_width), logical(physical_height), scale)
    }

    pub fn apply_command(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::TogglePause => self.driver.toggle_pause(),
            ViewerCommand::Quit => {
                info!("Quit requested from keyboard");
                self.stop();
            }
        }
    }

    pub fn apply_debug_request(&mut self, request: DebugRequest) {
        match request {
            DebugRequest::SetPanelField { field, value } => {
                match self.panel.apply(&mut self.context.camera, &field, value) {
                    Ok(write) => {
                        // Settling drag motion would otherwise move the camera off the
                        // written value on the same tick.
                        self.controls.stop();
                        debug!(
                            "Panel '{}' set to {} (requested {})",
                            write.field, write.applied, write.requested
                        );
                    }
                    Err(e) => warn!("Panel write rejected: {e}"),
                }
            }
            DebugRequest::Pause => self.driver.pause(),
            DebugRequest::Resume => self.driver.resume(),
            DebugRequest::Quit => {
                info!("Quit requested from debug API");
                self.stop();
            }
        }
    }

    fn collect_textures(&mut self) {
        for outcome in self.loader.drain_outcomes() {
            match outcome.result {
                Ok(_) => self.textures_loaded += 1,
                Err(_) => self.textures_failed += 1,
            }
        }
    }

    /// Run one frame: apply queued input, advance the animation, move the
    /// camera and draw. Returns `false` once the viewer has been stopped.
    pub fn frame(
        &mut self,
        renderer: &mut dyn FrameRenderer,
        scheduler: &mut dyn FrameScheduler,
    ) -> bool {
        self.collect_textures();

        for command in self.bindings.commands(&self.keyboard) {
            self.apply_command(command);
        }

        let input = self.mouse.control_input(self.pointer_height);
        if !input.is_idle() {
            self.controls.handle_input(&input);
        }
        self.mouse.clear_transients();
        self.keyboard.clear_transients();

        let running = self.driver.tick(
            &mut self.context,
            &self.system,
            &mut self.controls,
            renderer,
            scheduler,
        );
        if running {
            self.clock.tick();
        }
        running
    }

    /// Copy frame metrics and panel values into the debug state.
    pub fn publish(&self, state: &mut DebugState) {
        let viewport = &self.context.viewport;
        state.frame_count = self.clock.frame_count();
        state.frame_time_ms = self.clock.frame_time_ms();
        state.fps = self.clock.fps();
        state.uptime_seconds = self.clock.uptime_seconds();
        state.window_width = viewport.width;
        state.window_height = viewport.height;
        state.pixel_ratio = viewport.pixel_ratio;
        state.sun_angle = self.context.scene.graph.spin(self.system.sun).unwrap_or(0.0);
        state.camera_position = self.context.camera.position.to_array();
        state.paused = self.driver.is_paused();
        state.quit_requested |= !self.driver.is_running();
        state.panel = self
            .panel
            .fields()
            .iter()
            .map(|field| PanelFieldState {
                name: field.name.to_string(),
                min: field.min,
                max: field.max,
                step: field.step,
                value: field.read(&self.context.camera),
            })
            .collect();
    }

    pub fn textures_loaded(&self) -> usize {
        self.textures_loaded
    }

    pub fn textures_failed(&self) -> usize {
        self.textures_failed
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use orrery_input::RawKeyEvent;
    use orrery_scene::ManualScheduler;
    use winit::event::{ElementState, MouseButton};
    use winit::keyboard::KeyCode;

    use super::*;

    #[derive(Default)]
    struct CountingRenderer {
        frames: u32,
    }

    impl FrameRenderer for CountingRenderer {
        fn render(&mut self, _scene: &Scene, _camera: &PerspectiveCamera) {
            self.frames += 1;
        }
    }

    fn viewer(dir: &std::path::Path) -> Viewer {
        let mut config = Config::default();
        config.assets.texture_dir = dir.to_path_buf();
        config.controls.enable_damping = false;
        Viewer::new(&config)
    }

    fn press(viewer: &mut Viewer, key: KeyCode) {
        viewer.keyboard.process_raw(RawKeyEvent {
            key,
            state: ElementState::Pressed,
            repeat: false,
        });
    }

    fn sun_spin(viewer: &Viewer) -> f32 {
        viewer
            .context()
            .scene
            .graph
            .spin(viewer.system().sun)
            .unwrap()
    }

    #[test]
    fn test_frame_advances_and_reschedules() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        for _ in 0..3 {
            assert!(viewer.frame(&mut renderer, &mut scheduler));
        }
        assert_eq!(renderer.frames, 3);
        assert_eq!(scheduler.requested(), 3);
        assert!((sun_spin(&viewer) - 0.003).abs() < 1e-6);
    }

    #[test]
    fn test_space_pauses_and_resumes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        press(&mut viewer, KeyCode::Space);
        viewer.frame(&mut renderer, &mut scheduler);
        assert!(viewer.is_paused());
        assert_eq!(sun_spin(&viewer), 0.0);
        // Still rendering while paused.
        assert_eq!(renderer.frames, 1);

        viewer.keyboard.process_raw(RawKeyEvent {
            key: KeyCode::Space,
            state: ElementState::Released,
            repeat: false,
        });
        press(&mut viewer, KeyCode::Space);
        viewer.frame(&mut renderer, &mut scheduler);
        assert!(!viewer.is_paused());
        assert!(sun_spin(&viewer) > 0.0);
    }

    #[test]
    fn test_escape_stops_before_drawing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        press(&mut viewer, KeyCode::Escape);
        assert!(!viewer.frame(&mut renderer, &mut scheduler));
        assert!(!viewer.is_running());
        assert_eq!(renderer.frames, 0);
        assert_eq!(scheduler.requested(), 0);
    }

    #[test]
    fn test_panel_write_is_clamped_and_survives_the_frame() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        viewer.apply_debug_request(DebugRequest::SetPanelField {
            field: "z".to_string(),
            value: 500.0,
        });
        viewer.frame(&mut renderer, &mut scheduler);
        assert_eq!(viewer.camera().position.z, 150.0);

        viewer.apply_debug_request(DebugRequest::SetPanelField {
            field: "z".to_string(),
            value: 42.0,
        });
        viewer.frame(&mut renderer, &mut scheduler);
        assert_eq!(viewer.camera().position.z, 42.0);
    }

    #[test]
    fn test_panel_write_cancels_settling_drag() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.assets.texture_dir = tmp.path().to_path_buf();
        let mut viewer = Viewer::new(&config);
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        viewer.mouse.on_cursor_moved(100.0, 100.0);
        viewer.mouse.on_button(MouseButton::Left, ElementState::Pressed);
        viewer.mouse.on_cursor_moved(300.0, 100.0);
        viewer.mouse.on_button(MouseButton::Left, ElementState::Released);
        for _ in 0..10 {
            viewer.frame(&mut renderer, &mut scheduler);
        }

        viewer.apply_debug_request(DebugRequest::SetPanelField {
            field: "z".to_string(),
            value: 42.0,
        });
        viewer.frame(&mut renderer, &mut scheduler);
        assert_eq!(viewer.camera().position.z, 42.0);
    }

    #[test]
    fn test_debug_api_accepts_every_panel_field() {
        let names: Vec<_> = DebugPanel::camera_position()
            .fields()
            .iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, orrery_debug::PANEL_FIELDS);
    }

    #[test]
    fn test_unknown_panel_field_leaves_camera_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let before = viewer.camera().position;
        viewer.apply_debug_request(DebugRequest::SetPanelField {
            field: "w".to_string(),
            value: 1.0,
        });
        assert_eq!(viewer.camera().position, before);
    }

    #[test]
    fn test_debug_pause_resume_quit() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        viewer.apply_debug_request(DebugRequest::Pause);
        assert!(viewer.is_paused());
        viewer.apply_debug_request(DebugRequest::Resume);
        assert!(!viewer.is_paused());
        viewer.apply_debug_request(DebugRequest::Quit);
        assert!(!viewer.is_running());
    }

    #[test]
    fn test_left_drag_orbits_camera() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();
        let before = viewer.camera().position;
        let distance = viewer.camera().distance_to_target();

        viewer.mouse.on_cursor_moved(100.0, 100.0);
        viewer.mouse.on_button(MouseButton::Left, ElementState::Pressed);
        viewer.mouse.on_cursor_moved(160.0, 100.0);
        viewer.frame(&mut renderer, &mut scheduler);

        let after = viewer.camera().position;
        assert_ne!(after, before);
        assert!((viewer.camera().distance_to_target() - distance).abs() < 1e-3);
    }

    #[test]
    fn test_resize_keeps_rotation_state() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();
        viewer.frame(&mut renderer, &mut scheduler);
        let spin = sun_spin(&viewer);

        let size = viewer.resize(2560, 1440, 2.0);
        assert_eq!((size.width, size.height), (2560, 1440));
        assert_eq!(size.pixel_ratio, 2.0);
        assert_eq!(viewer.context().viewport.width, 1280);
        assert!((viewer.camera().aspect - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(sun_spin(&viewer), spin);

        // Density above the cap renders at the cap.
        let size = viewer.resize(3000, 1500, 3.0);
        assert_eq!((size.width, size.height), (2000, 1000));
    }

    #[test]
    fn test_publish_fills_debug_state() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();
        viewer.frame(&mut renderer, &mut scheduler);

        let mut state = DebugState::default();
        viewer.publish(&mut state);
        assert_eq!(state.frame_count, 1);
        assert_eq!(state.window_width, 1280);
        assert_eq!(state.window_height, 720);
        assert!((state.sun_angle - 0.001).abs() < 1e-6);
        assert_eq!(state.camera_position, viewer.camera().position.to_array());
        assert_eq!(state.panel.len(), 3);
        assert_eq!(state.panel[0].name, "z");
        assert_eq!(state.panel[0].value, viewer.camera().position.z);
        assert!(!state.quit_requested);
    }

    #[test]
    fn test_missing_textures_are_counted() {
        let tmp = tempfile::tempdir().unwrap();
        let mut viewer = viewer(tmp.path());
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        // sun, stars and eight planets, none of which exist on disk.
        let deadline = Instant::now() + Duration::from_secs(5);
        while viewer.textures_failed() < 10 && Instant::now() < deadline {
            viewer.frame(&mut renderer, &mut scheduler);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(viewer.textures_failed(), 10);
        assert_eq!(viewer.textures_loaded(), 0);
    }
}

//! Per-frame rotation updates and the frame step around them.
//!
//! A frame is: advance every rotation angle, let the camera controls move the
//! camera, render, then ask the scheduler for the next frame. The scheduler,
//! controls and renderer are traits so tests can drive frames one at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::builder::SolarSystem;
use crate::camera::PerspectiveCamera;
use crate::context::SceneContext;
use crate::controls::OrbitControls;
use crate::graph::Scene;
use crate::planets::SUN_SPIN_SPEED;

/// Arranges for the next frame to run once the host is ready to draw again.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Moves the camera from input gathered since the last frame.
pub trait CameraControl {
    fn update(&mut self, camera: &mut PerspectiveCamera);
}

/// Draws the scene from the camera's point of view.
pub trait FrameRenderer {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera);
}

impl CameraControl for OrbitControls {
    fn update(&mut self, camera: &mut PerspectiveCamera) {
        OrbitControls::update(self, camera);
    }
}

/// Scheduler that only counts requests. Frames run when the caller says so.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requested: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Consume one pending request. Returns `false` when none is pending.
    pub fn take(&mut self) -> bool {
        if self.requested == 0 {
            return false;
        }
        self.requested -= 1;
        true
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.requested += 1;
    }
}

/// Cloneable, thread-safe flag that ends the frame loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Advances the solar system one fixed increment per frame.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    frame: u64,
    paused: bool,
    stop: StopHandle,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames whose rotations have been applied.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze rotations. Frames keep rendering so the camera still moves.
    pub fn pause(&mut self) {
        if !self.paused {
            tracing::info!("Animation paused at frame {}", self.frame);
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            tracing::info!("Animation resumed at frame {}", self.frame);
        }
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Apply one frame of rotation: the sun, then every orbit group, then
    /// every planet body. Does nothing while paused.
    pub fn step(&mut self, scene: &mut Scene, system: &SolarSystem) {
        if self.paused {
            return;
        }

        let graph = &mut scene.graph;
        graph.add_spin(system.sun, SUN_SPIN_SPEED);

        for (planet, &group) in system.planets.iter().zip(&system.orbit_groups) {
            graph.add_spin(group, planet.rotation_speed);
        }

        // Self-spin uses the same rate as the revolution.
        for (planet, &body) in system.planets.iter().zip(&system.planet_bodies) {
            graph.add_spin(body, planet.rotation_speed);
        }

        self.frame += 1;
    }

    /// Run one full frame and reschedule. Returns `false` once stopped, in
    /// which case nothing is updated, drawn or scheduled.
    pub fn tick(
        &mut self,
        context: &mut SceneContext,
        system: &SolarSystem,
        controls: &mut dyn CameraControl,
        renderer: &mut dyn FrameRenderer,
        scheduler: &mut dyn FrameScheduler,
    ) -> bool {
        if self.stop.is_stopped() {
            return false;
        }

        self.step(&mut context.scene, system);
        controls.update(&mut context.camera);
        renderer.render(&context.scene, &context.camera);
        scheduler.request_frame();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;
    use crate::asset::StaticTextureProvider;
    use crate::builder::build_solar_system;
    use crate::context::Viewport;
    use crate::planets::REFERENCE_PLANETS;

    #[derive(Default)]
    struct CountingRenderer {
        frames: u32,
        last_sun_spin: Option<f32>,
        sun: Option<crate::graph::NodeId>,
    }

    impl FrameRenderer for CountingRenderer {
        fn render(&mut self, scene: &Scene, _camera: &PerspectiveCamera) {
            self.frames += 1;
            self.last_sun_spin = self.sun.and_then(|id| scene.graph.spin(id));
        }
    }

    #[derive(Default)]
    struct CountingControls {
        updates: u32,
    }

    impl CameraControl for CountingControls {
        fn update(&mut self, _camera: &mut PerspectiveCamera) {
            self.updates += 1;
        }
    }

    fn setup() -> (SceneContext, SolarSystem) {
        let mut scene = Scene::new();
        let system = build_solar_system(
            &mut scene,
            &REFERENCE_PLANETS,
            &StaticTextureProvider::new(),
        );
        let context = SceneContext::new(
            scene,
            PerspectiveCamera::default(),
            Viewport::new(1920, 1080, 1.0, 2.0),
        );
        (context, system)
    }

    /// Distance between two angles on the circle.
    fn angle_diff(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    fn run(
        driver: &mut AnimationDriver,
        context: &mut SceneContext,
        system: &SolarSystem,
        frames: u32,
    ) {
        for _ in 0..frames {
            driver.step(&mut context.scene, system);
        }
    }

    #[test]
    fn test_sun_angle_is_frames_times_speed() {
        for f in [0u32, 1, 10, 500, 2000] {
            let (mut ctx, system) = setup();
            let mut driver = AnimationDriver::new();
            run(&mut driver, &mut ctx, &system, f);
            let spin = ctx.scene.graph.spin(system.sun).unwrap();
            assert!(
                angle_diff(spin, f as f32 * SUN_SPIN_SPEED) < 1e-3,
                "f = {f}, spin = {spin}"
            );
        }
    }

    #[test]
    fn test_earth_after_1000_frames() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        run(&mut driver, &mut ctx, &system, 1000);

        let earth = system.index_of("earth").unwrap();
        let group = ctx.scene.graph.spin(system.orbit_groups[earth]).unwrap();
        let body = ctx.scene.graph.spin(system.planet_bodies[earth]).unwrap();

        assert!(angle_diff(group, 6.5) < 1e-3, "group = {group}");
        assert!((group - (6.5 - TAU)).abs() < 1e-3);
        assert_eq!(group, body);
        assert_eq!(driver.frame(), 1000);
    }

    #[test]
    fn test_every_group_and_body_share_rate() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        run(&mut driver, &mut ctx, &system, 250);

        for (i, planet) in system.planets.iter().enumerate() {
            let expected = 250.0 * planet.rotation_speed;
            let group = ctx.scene.graph.spin(system.orbit_groups[i]).unwrap();
            let body = ctx.scene.graph.spin(system.planet_bodies[i]).unwrap();
            assert!(angle_diff(group, expected) < 1e-3, "{}", planet.name);
            assert_eq!(group, body, "{}", planet.name);
        }
    }

    #[test]
    fn test_orbit_paths_and_rings_never_spin() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        run(&mut driver, &mut ctx, &system, 100);
        for &id in system.orbit_paths.iter().chain(&system.rings) {
            assert_eq!(ctx.scene.graph.spin(id), Some(0.0));
        }
    }

    #[test]
    fn test_tick_runs_all_stages_in_order() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        let mut controls = CountingControls::default();
        let mut renderer = CountingRenderer {
            sun: Some(system.sun),
            ..CountingRenderer::default()
        };
        let mut scheduler = ManualScheduler::new();

        assert!(driver.tick(&mut ctx, &system, &mut controls, &mut renderer, &mut scheduler));
        assert_eq!(controls.updates, 1);
        assert_eq!(renderer.frames, 1);
        // The renderer saw the already-advanced angle.
        assert_eq!(renderer.last_sun_spin, Some(SUN_SPIN_SPEED));
        assert_eq!(scheduler.requested(), 1);
    }

    #[test]
    fn test_manual_scheduler_drives_frames() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        let mut controls = CountingControls::default();
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        scheduler.request_frame();
        let mut ran = 0;
        while ran < 60 && scheduler.take() {
            driver.tick(&mut ctx, &system, &mut controls, &mut renderer, &mut scheduler);
            ran += 1;
        }
        assert_eq!(ran, 60);
        assert_eq!(driver.frame(), 60);
    }

    #[test]
    fn test_stop_handle_ends_loop() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        let mut controls = CountingControls::default();
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        let handle = driver.stop_handle();
        std::thread::spawn(move || handle.stop()).join().unwrap();

        assert!(!driver.tick(&mut ctx, &system, &mut controls, &mut renderer, &mut scheduler));
        assert!(!driver.is_running());
        assert_eq!(renderer.frames, 0);
        assert_eq!(scheduler.requested(), 0);
        assert_eq!(ctx.scene.graph.spin(system.sun), Some(0.0));
    }

    #[test]
    fn test_pause_freezes_angles_but_keeps_rendering() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        let mut controls = CountingControls::default();
        let mut renderer = CountingRenderer::default();
        let mut scheduler = ManualScheduler::new();

        driver.pause();
        for _ in 0..5 {
            driver.tick(&mut ctx, &system, &mut controls, &mut renderer, &mut scheduler);
        }
        assert_eq!(driver.frame(), 0);
        assert_eq!(renderer.frames, 5);
        assert_eq!(ctx.scene.graph.spin(system.sun), Some(0.0));

        driver.toggle_pause();
        driver.tick(&mut ctx, &system, &mut controls, &mut renderer, &mut scheduler);
        assert_eq!(driver.frame(), 1);
    }

    #[test]
    fn test_resize_leaves_angles_alone() {
        let (mut ctx, system) = setup();
        let mut driver = AnimationDriver::new();
        run(&mut driver, &mut ctx, &system, 300);

        let before: Vec<_> = system
            .orbit_groups
            .iter()
            .chain(&system.planet_bodies)
            .map(|&id| ctx.scene.graph.spin(id))
            .collect();

        ctx.resize(800, 600, 1.0);
        assert!((ctx.camera.aspect - 800.0 / 600.0).abs() < 1e-6);

        let after: Vec<_> = system
            .orbit_groups
            .iter()
            .chain(&system.planet_bodies)
            .map(|&id| ctx.scene.graph.spin(id))
            .collect();
        assert_eq!(before, after);
    }
}

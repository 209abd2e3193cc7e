//! Window creation and event handling via winit.
//!
//! [`App`] implements winit's [`ApplicationHandler`]: it owns the window, the
//! GPU renderer and the debug link, and forwards input and redraws to the
//! [`Viewer`].

use std::sync::Arc;

use orrery_config::Config;
use orrery_debug::RenderMetrics;
use orrery_render::{
    RenderContextError, SceneRenderer, ShaderError, SurfaceError, SurfaceOptions,
    init_render_context_blocking,
};
use orrery_scene::FrameScheduler;
use tracing::{error, info, instrument};
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::debug_link::DebugLink;
use crate::viewer::Viewer;

/// Reasons the viewer stops with an error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] OsError),
    #[error("GPU initialization failed: {0}")]
    RenderContext(#[from] RenderContextError),
    #[error("shader setup failed: {0}")]
    Shader(#[from] ShaderError),
    #[error("rendering stopped: {0}")]
    Surface(#[from] SurfaceError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attributes = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .with_transparent(config.render.transparent);

    if config.window.fullscreen {
        attributes.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attributes
    }
}

/// Schedules the next frame through winit's redraw request.
struct RedrawScheduler<'w> {
    window: &'w Window,
}

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

/// Application state: window, renderer and the viewer they display.
pub struct App {
    config: Config,
    viewer: Viewer,
    debug: DebugLink,
    window: Option<Arc<Window>>,
    renderer: Option<SceneRenderer>,
    failure: Option<AppError>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            viewer: Viewer::new(&config),
            debug: DebugLink::detached(),
            window: None,
            renderer: None,
            failure: None,
            config,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Stop background services and report why the loop ended, if it failed.
    pub fn finish(mut self) -> Result<(), AppError> {
        self.debug.stop();
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: AppError) {
        error!("{e}");
        self.failure = Some(e);
        self.viewer.stop();
        event_loop.exit();
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let attributes = window_attributes_from_config(&self.config);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let scale_factor = window.scale_factor();
        let inner = window.inner_size();
        let size = self.viewer.resize(inner.width, inner.height, scale_factor);
        info!(
            "Window {}x{} (scale {:.2}), rendering at {}x{}",
            inner.width, inner.height, scale_factor, size.width, size.height
        );

        let options = SurfaceOptions::from_config(
            &self.config.window,
            &self.config.render,
            size.width,
            size.height,
        );
        let context = init_render_context_blocking(Arc::clone(&window), options)?;
        self.renderer = Some(SceneRenderer::new(context, &self.config.render)?);

        self.debug = DebugLink::start(&self.config.debug);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        let size = self.viewer.resize(width, height, scale_factor);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size);
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (&self.window, &mut self.renderer) else {
            return;
        };

        for request in self.debug.drain_requests() {
            self.viewer.apply_debug_request(request);
        }

        let mut scheduler = RedrawScheduler { window: window.as_ref() };
        let running = self.viewer.frame(renderer, &mut scheduler);

        let stats = renderer.stats();
        let fatal = renderer.take_fatal_error();
        self.debug.publish(|state| {
            self.viewer.publish(state);
            state.render = RenderMetrics {
                draw_calls: stats.draw_calls,
                meshes: stats.meshes,
                textures: stats.textures,
                frames_skipped: stats.frames_skipped,
                background_visible: stats.background_visible,
            };
        });

        if let Some(e) = fatal {
            self.fail(event_loop, e.into());
        } else if !running {
            info!("Viewer stopped, shutting down");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.initialize(event_loop)
        {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.viewer.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let scale_factor = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                self.resize(new_size.width, new_size.height, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(inner) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize(inner.width, inner.height, scale_factor);
                }
            }
            WindowEvent::Focused(false) => self.viewer.keyboard.reset(),
            WindowEvent::KeyboardInput { event, .. } => self.viewer.keyboard.process_event(&event),
            WindowEvent::CursorMoved { position, .. } => {
                self.viewer.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorEntered { .. } => self.viewer.mouse.on_cursor_entered(),
            WindowEvent::CursorLeft { .. } => self.viewer.mouse.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.viewer.mouse.on_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => self.viewer.mouse.on_scroll(delta),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.debug.stop();
    }
}

/// Creates an event loop and runs the viewer until the window closes.
#[instrument(skip_all)]
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    app.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = Config::default();
        config.window.fullscreen = true;
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Orrery - Solar System");
        assert!(attrs.transparent);
        assert!(attrs.fullscreen.is_some());
    }

    #[test]
    fn test_windowed_by_default() {
        let attrs = window_attributes_from_config(&Config::default());
        assert!(attrs.fullscreen.is_none());
        assert_eq!(
            attrs.inner_size,
            Some(winit::dpi::LogicalSize::new(1280.0, 720.0).into())
        );
    }

    #[test]
    fn test_app_starts_without_window() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.assets.texture_dir = tmp.path().to_path_buf();
        let app = App::new(config);
        assert!(app.window.is_none());
        assert!(app.renderer.is_none());
        assert!(app.viewer().is_running());
        assert!(app.finish().is_ok());
    }

    #[test]
    fn test_surface_failure_maps_to_app_error() {
        let e: AppError = SurfaceError::Lost.into();
        assert!(matches!(e, AppError::Surface(SurfaceError::Lost)));
        assert_eq!(e.to_string(), "rendering stopped: surface lost");
    }
}

//! Bridge between the frame loop and the debug HTTP server.
//!
//! Release builds keep the shared state but never start a server, so the
//! frame loop does not need to care which build it runs in.

use std::sync::{Arc, Mutex, PoisonError};

use orrery_config::DebugConfig;
use orrery_debug::{DebugRequest, DebugState};
#[cfg(debug_assertions)]
use orrery_debug::DebugServer;

/// Shared debug state plus the server that serves it, when one is running.
pub struct DebugLink {
    state: Arc<Mutex<DebugState>>,
    #[cfg(debug_assertions)]
    server: Option<DebugServer>,
}

impl DebugLink {
    /// A link with no server attached.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(Mutex::new(DebugState::default())),
            #[cfg(debug_assertions)]
            server: None,
        }
    }

    /// Start the debug server if the config enables it. A port taken by
    /// another process only costs the debug surface.
    pub fn start(config: &DebugConfig) -> Self {
        #[allow(unused_mut)]
        let mut link = Self::detached();

        #[cfg(debug_assertions)]
        if config.panel_enabled {
            let port = orrery_debug::debug_port(config.panel_port);
            let mut server = DebugServer::new(port);
            match server.start(Arc::clone(&link.state)) {
                Ok(()) => {
                    tracing::info!("Debug panel on http://127.0.0.1:{}", server.actual_port());
                    link.server = Some(server);
                }
                Err(e) => tracing::warn!("Failed to start debug server: {e}"),
            }
        }

        #[cfg(not(debug_assertions))]
        let _ = config;

        link
    }

    pub fn is_serving(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            self.server.as_ref().is_some_and(DebugServer::is_running)
        }
        #[cfg(not(debug_assertions))]
        {
            false
        }
    }

    /// Requests received since the last frame.
    pub fn drain_requests(&self) -> Vec<DebugRequest> {
        #[cfg(debug_assertions)]
        if let Some(server) = &self.server {
            return server.drain_requests();
        }
        Vec::new()
    }

    /// Update the shared state in place.
    pub fn publish(&self, update: impl FnOnce(&mut DebugState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut state);
    }

    pub fn snapshot(&self) -> DebugState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stop(&mut self) {
        #[cfg(debug_assertions)]
        if let Some(mut server) = self.server.take() {
            server.stop();
        }
    }
}

//! HTTP debug server implementation.

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::{DebugRequest, DebugState, PANEL_FIELDS, PanelFieldState};

#[derive(Debug, thiserror::Error)]
pub enum DebugServerError {
    #[error("Failed to bind to port {port}: {error}")]
    BindError { port: u16, error: String },
    #[error("Debug server already running on port {0}")]
    AlreadyRunning(u16),
}

type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP server for the debug API.
/// Runs on a background thread; requests that change the scene are queued for
/// the frame loop, which drains them with [`DebugServer::drain_requests`].
pub struct DebugServer {
    port: u16,
    actual_port: Option<u16>,
    server: Option<Arc<Server>>,
    handle: Option<JoinHandle<()>>,
    sender: Sender<DebugRequest>,
    receiver: Receiver<DebugRequest>,
}

#[derive(Deserialize)]
struct Command {
    command: String,
}

#[derive(Serialize)]
struct CommandResponse {
    executed: bool,
    command: String,
}

#[derive(Deserialize)]
struct PanelWriteRequest {
    field: String,
    value: f32,
}

#[derive(Serialize)]
struct PanelWriteResponse {
    queued: bool,
    field: String,
    value: f32,
}

#[derive(Serialize)]
struct PanelResponse<'a> {
    fields: &'a [PanelFieldState],
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl DebugServer {
    pub fn new(port: u16) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            port,
            actual_port: None,
            server: None,
            handle: None,
            sender,
            receiver,
        }
    }

    /// Bind on localhost and start serving. Port 0 lets the OS pick one.
    pub fn start(&mut self, state: Arc<Mutex<DebugState>>) -> Result<(), DebugServerError> {
        if self.server.is_some() {
            return Err(DebugServerError::AlreadyRunning(self.actual_port()));
        }

        let server = Server::http(format!("127.0.0.1:{}", self.port)).map_err(|e| {
            DebugServerError::BindError {
                port: self.port,
                error: e.to_string(),
            }
        })?;

        let actual_port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        self.actual_port = Some(actual_port);

        let server = Arc::new(server);
        let worker = Arc::clone(&server);
        let sender = self.sender.clone();
        let handle = thread::Builder::new()
            .name("orrery-debug-server".into())
            .spawn(move || Self::run_server(&worker, &state, &sender))
            .map_err(|e| DebugServerError::BindError {
                port: actual_port,
                error: e.to_string(),
            })?;

        tracing::info!(port = actual_port, "debug server listening");
        self.server = Some(server);
        self.handle = Some(handle);
        Ok(())
    }

    /// Unblock the accept loop and wait for the server thread.
    pub fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            server.unblock();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("debug server thread panicked");
            }
        }
    }

    pub fn actual_port(&self) -> u16 {
        self.actual_port.unwrap_or(self.port)
    }

    pub fn is_running(&self) -> bool {
        self.server.is_some()
    }

    /// Requests received since the last call, oldest first.
    pub fn drain_requests(&self) -> Vec<DebugRequest> {
        self.receiver.try_iter().collect()
    }

    fn run_server(server: &Server, state: &Mutex<DebugState>, sender: &Sender<DebugRequest>) {
        for request in server.incoming_requests() {
            if let Err(e) = Self::handle_request(request, state, sender) {
                tracing::warn!("debug server error: {e}");
            }
        }
        tracing::debug!("debug server stopped");
    }

    fn handle_request(
        mut request: Request,
        state: &Mutex<DebugState>,
        sender: &Sender<DebugRequest>,
    ) -> Result<(), HandlerError> {
        let response = match (request.method(), request.url()) {
            (&Method::Get, "/health") => {
                let uptime_seconds = lock(state).uptime_seconds;
                json(&HealthResponse {
                    status: "ok".to_string(),
                    uptime_seconds,
                })?
            }
            (&Method::Get, "/metrics") => json(&*lock(state))?,
            (&Method::Get, "/panel") => {
                let debug_state = lock(state);
                json(&PanelResponse {
                    fields: &debug_state.panel,
                })?
            }
            (&Method::Post, "/panel") => {
                match read_json::<PanelWriteRequest>(&mut request) {
                    Ok(write) => {
                        // The published list is empty until the first frame.
                        if PANEL_FIELDS.contains(&write.field.as_str()) {
                            sender.send(DebugRequest::SetPanelField {
                                field: write.field.clone(),
                                value: write.value,
                            })?;
                            json(&PanelWriteResponse {
                                queued: true,
                                field: write.field,
                                value: write.value,
                            })?
                            .with_status_code(202)
                        } else {
                            bad_request(format!("unknown panel field '{}'", write.field))?
                        }
                    }
                    Err(e) => bad_request(e.to_string())?,
                }
            }
            (&Method::Post, "/command") => match read_json::<Command>(&mut request) {
                Ok(command) => {
                    let queued = match command.command.as_str() {
                        "quit" => {
                            lock(state).quit_requested = true;
                            Some(DebugRequest::Quit)
                        }
                        "pause" => Some(DebugRequest::Pause),
                        "resume" => Some(DebugRequest::Resume),
                        _ => None,
                    };
                    let executed = queued.is_some();
                    if let Some(queued) = queued {
                        sender.send(queued)?;
                    }
                    json(&CommandResponse {
                        executed,
                        command: command.command,
                    })?
                }
                Err(e) => bad_request(e.to_string())?,
            },
            _ => Response::from_string("Not Found").with_status_code(404),
        };

        request.respond(response)?;
        Ok(())
    }
}

impl Drop for DebugServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A poisoned lock still holds plain data; keep serving it.
fn lock(state: &Mutex<DebugState>) -> std::sync::MutexGuard<'_, DebugState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_json<T: for<'de> Deserialize<'de>>(request: &mut Request) -> Result<T, HandlerError> {
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body)?;
    Ok(serde_json::from_str(&body)?)
}

fn json<T: Serialize>(value: &T) -> Result<Response<Cursor<Vec<u8>>>, HandlerError> {
    let mut response = Response::from_string(serde_json::to_string(value)?);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    Ok(response)
}

fn bad_request(error: String) -> Result<Response<Cursor<Vec<u8>>>, HandlerError> {
    Ok(json(&ErrorResponse { error })?.with_status_code(400))
}

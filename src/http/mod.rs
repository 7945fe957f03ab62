//! HTTP API server for external control
//!
//! This module exposes the recording controller to a host process:
//! - POST /recording/start - Start a session (body: recording options)
//! - POST /recording/pause, /recording/resume - Suspend / continue capture
//! - POST /recording/stop - Stop, merge and return the recording
//! - GET /recording/status - Current session status
//! - POST /interruptions/began, /interruptions/ended - Environment notifications
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

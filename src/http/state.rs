use crate::session::{InterruptionHub, RecordingController};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The process's recording state machine
    pub controller: RecordingController,
    /// Where interruption notifications from the host are posted
    pub interruptions: InterruptionHub,
}

impl AppState {
    pub fn new(controller: RecordingController, interruptions: InterruptionHub) -> Self {
        Self {
            controller,
            interruptions,
        }
    }
}

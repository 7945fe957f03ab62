use thiserror::Error;

/// Failures reported by recorder operations
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Microphone permission has not been granted")]
    PermissionDenied,

    #[error("A recording session is already in progress")]
    AlreadyRecording,

    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("No recording session is in progress")]
    NotRecording,

    #[error("Failed to merge recording segments: {0}")]
    MergeFailed(String),

    #[error("Recording is empty or corrupt")]
    EmptyOrCorruptRecording,

    #[error("Recording storage error: {0:#}")]
    Storage(#[source] anyhow::Error),

    #[error("Recorder is no longer running")]
    ControllerClosed,
}

impl RecorderError {
    /// Stable machine-readable code for host bridges
    pub fn code(&self) -> &'static str {
        match self {
            RecorderError::PermissionDenied => "MISSING_PERMISSION",
            RecorderError::AlreadyRecording => "ALREADY_RECORDING",
            RecorderError::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            RecorderError::NotRecording => "RECORDING_HAS_NOT_STARTED",
            RecorderError::MergeFailed(_) => "MERGE_FAILED",
            RecorderError::EmptyOrCorruptRecording => "EMPTY_RECORDING",
            RecorderError::Storage(_) => "STORAGE_ERROR",
            RecorderError::ControllerClosed => "RECORDER_CLOSED",
        }
    }
}

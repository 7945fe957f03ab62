use serde::{Deserialize, Serialize};

/// Where the recording lands on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputLocation {
    /// Platform cache directory
    Cache,
    /// Platform application-data directory
    Library,
    /// Recorder's own recordings directory; output is returned inline
    #[default]
    Default,
}

impl OutputLocation {
    /// Explicit locations return a relative path instead of inline bytes
    pub fn is_explicit(&self) -> bool {
        !matches!(self, OutputLocation::Default)
    }
}

/// Options fixed for the lifetime of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    #[serde(default)]
    pub output_location: OutputLocation,
    #[serde(default)]
    pub sub_directory: Option<String>,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordingStatus {
    #[default]
    None,
    Recording,
    Paused,
    Interrupted,
}

/// Recording payload: inline base64 bytes or a path relative to the
/// requested output location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordingValue {
    Inline { base64: String },
    Path { path: String },
}

/// Result of a successful stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingData {
    pub value: RecordingValue,
    pub duration_ms: u64,
    pub mime_type: String,
}

use serde::Serialize;

/// Outbound notifications for the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RecorderEvent {
    /// Capture was halted by an external claim on the microphone
    InterruptionBegan,
    /// The external claim ended; the session stays interrupted until the
    /// caller resumes or stops
    InterruptionEnded,
    /// Periodic level sample in `[0.0, 1.0]`
    VolumeChanged { level: f32 },
}

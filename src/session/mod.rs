//! Recording session management
//!
//! This module provides the session state machine and its parts:
//! - `RecordingController`: serialized start/pause/resume/stop and interruption handling
//! - `SegmentStore`: ordered segments produced by one session
//! - `InterruptionMonitor`: environment interruption notifications → controller signals
//! - Options, status and result types shared with hosts

mod controller;
mod events;
mod interruption;
mod options;
mod segments;
mod session;

pub use controller::{ControllerBuilder, RecordingController};
pub use events::RecorderEvent;
pub use interruption::{
    InterruptionHub, InterruptionMonitor, InterruptionSignal, InterruptionSource, RawInterruption,
};
pub use options::{OutputLocation, RecordingData, RecordingOptions, RecordingStatus, RecordingValue};
pub use segments::{Segment, SegmentStore};
pub use session::RecordingSession;

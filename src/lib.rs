pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod merge;
pub mod permissions;
pub mod session;
pub mod storage;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioFile, AudioFrame, AudioInfo, AudioSource,
    BackendFactory, CaptureDevice, DefaultBackendFactory,
};
pub use config::Config;
pub use error::RecorderError;
pub use http::{create_router, AppState};
pub use merge::{MergeError, MergeOutcome, Merger};
pub use permissions::{PermissionGate, StaticPermission};
pub use session::{
    InterruptionHub, OutputLocation, RawInterruption, RecorderEvent, RecordingController,
    RecordingData, RecordingOptions, RecordingStatus, RecordingValue, Segment, SegmentStore,
};
pub use storage::{DirectoryResolver, FixedDirectories, PlatformDirectories};

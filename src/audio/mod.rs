pub mod backend;
pub mod device;
pub mod file;
pub mod meter;
pub mod synthetic;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use backend::{
    AudioBackend, AudioBackendConfig, AudioFrame, AudioSource, BackendFactory,
    DefaultBackendFactory,
};
pub use device::{CaptureDevice, LevelProbe};
pub use file::{AudioFile, AudioInfo};
pub use meter::VolumeMeter;
pub use synthetic::SyntheticBackend;

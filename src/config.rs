use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioBackendConfig, AudioSource};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub metering: MeteringConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Synthetic,
    Microphone,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub recordings_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_duration_ms: u64,
    pub source: SourceKind,
    pub tone_hz: f32,
}

#[derive(Debug, Deserialize)]
pub struct MeteringConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl Config {
    /// Load `path` (any extension the config crate knows, optional) over
    /// built-in defaults, then `VOICE_RECORDER__SECTION__KEY` overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voice-recorder")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 7878)?
            .set_default("audio.recordings_path", "~/.voice-recorder/recordings")?
            .set_default("audio.sample_rate", 16000)?
            .set_default("audio.channels", 1)?
            .set_default("audio.frame_duration_ms", 100)?
            .set_default("audio.source", "synthetic")?
            .set_default("audio.tone_hz", 440.0)?
            .set_default("metering.enabled", false)?
            .set_default("metering.interval_ms", 50)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_RECORDER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl AudioConfig {
    /// Recordings root with `~` expanded
    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.recordings_path).as_ref())
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            buffer_duration_ms: self.frame_duration_ms,
        }
    }

    pub fn source(&self) -> AudioSource {
        match self.source {
            SourceKind::Synthetic => AudioSource::Synthetic {
                frequency_hz: self.tone_hz,
            },
            SourceKind::Microphone => AudioSource::Microphone,
        }
    }
}

impl MeteringConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.enabled
            .then(|| Duration::from_millis(self.interval_ms.max(1)))
    }
}

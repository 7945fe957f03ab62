use anyhow::Result;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the backend first started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Number of sample frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Root-mean-square level normalised to `[0.0, 1.0]`
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let v = s as f64 / i16::MAX as f64;
                v * v
            })
            .sum();
        ((sum / self.samples.len() as f64).sqrt() as f32).min(1.0)
    }
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate of the frames the backend delivers
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

impl AudioBackendConfig {
    /// Samples (across all channels) in one buffer
    pub fn samples_per_buffer(&self) -> usize {
        (self.sample_rate as u64 * self.buffer_duration_ms / 1000) as usize * self.channels as usize
    }
}

/// Audio capture backend trait
///
/// A backend may be started and stopped repeatedly; each `start` hands out a
/// fresh receiver and `stop` closes it.
///
/// Implementations:
/// - Synthetic: sine tone generator paced in real time
/// - Microphone: cpal default input device (`microphone` feature)
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Creates a fresh backend for every capture device the session opens
pub trait BackendFactory: Send + Sync {
    fn create(&self, config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>>;
}

/// Audio source type
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Generated sine tone (headless hosts, demos)
    Synthetic { frequency_hz: f32 },
    /// Default microphone input (`microphone` feature)
    Microphone,
}

/// Backend factory driven by the configured [`AudioSource`]
pub struct DefaultBackendFactory {
    source: AudioSource,
}

impl DefaultBackendFactory {
    pub fn new(source: AudioSource) -> Self {
        Self { source }
    }
}

impl BackendFactory for DefaultBackendFactory {
    fn create(&self, config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match &self.source {
            AudioSource::Synthetic { frequency_hz } => Ok(Box::new(
                super::synthetic::SyntheticBackend::new(config.clone(), *frequency_hz),
            )),

            AudioSource::Microphone => {
                #[cfg(feature = "microphone")]
                {
                    let backend = super::microphone::MicrophoneBackend::new(config.clone())?;
                    Ok(Box::new(backend))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    anyhow::bail!("Microphone capture requires the `microphone` feature")
                }
            }
        }
    }
}

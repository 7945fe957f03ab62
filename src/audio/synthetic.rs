// Synthetic audio backend: a sine tone paced in real time.
//
// Used when no physical input is available (CI hosts, headless servers) and
// by the HTTP demo. Frames are produced by a tokio task on a fixed interval,
// so tokio's paused clock makes the output deterministic in tests.

use anyhow::{bail, Result};
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

pub struct SyntheticBackend {
    config: AudioBackendConfig,
    frequency_hz: f32,
    /// Frames generated across every start/stop cycle
    frames_generated: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticBackend {
    pub fn new(config: AudioBackendConfig, frequency_hz: f32) -> Self {
        Self {
            config,
            frequency_hz,
            frames_generated: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for SyntheticBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }
        if self.config.sample_rate == 0 || self.config.channels == 0 {
            bail!("Invalid synthetic format: {:?}", self.config);
        }

        info!(
            "Starting synthetic tone ({:.0}Hz) at {}Hz, {} channels",
            self.frequency_hz, self.config.sample_rate, self.config.channels
        );

        let (tx, rx) = mpsc::channel(100);
        let config = self.config.clone();
        let frequency_hz = self.frequency_hz;
        let frames_generated = Arc::clone(&self.frames_generated);

        let task = tokio::spawn(async move {
            let frames_per_buffer = config.samples_per_buffer() / config.channels as usize;
            let mut ticker =
                tokio::time::interval(Duration::from_millis(config.buffer_duration_ms.max(1)));

            loop {
                ticker.tick().await;

                let start_frame = frames_generated.fetch_add(frames_per_buffer as u64, Ordering::SeqCst);
                let mut samples = Vec::with_capacity(frames_per_buffer * config.channels as usize);
                for n in 0..frames_per_buffer as u64 {
                    let t = (start_frame + n) as f32 / config.sample_rate as f32;
                    let value = ((TAU * frequency_hz * t).sin() * 0.25 * i16::MAX as f32) as i16;
                    for _ in 0..config.channels {
                        samples.push(value);
                    }
                }

                let frame = AudioFrame {
                    samples,
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms: start_frame * 1000 / config.sample_rate as u64,
                };

                if tx.send(frame).await.is_err() {
                    debug!("Synthetic frame receiver dropped");
                    break;
                }
            }
        });

        self.task = Some(task);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            info!("Stopping synthetic tone");
            task.abort();
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "synthetic tone"
    }
}

impl Drop for SyntheticBackend {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

//! Microphone capture via `cpal`.
//!
//! `cpal::Stream` is not `Send` on every platform, so the stream lives on a
//! dedicated capture thread for as long as the backend is started. The
//! thread parks on a stop channel; dropping the stream there halts the
//! hardware.

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

/// Errors that can occur while opening the input stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query supported input configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("input device does not support {sample_rate}Hz with {channels} channel(s)")]
    UnsupportedFormat { sample_rate: u32, channels: u16 },

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

struct CaptureThread {
    stop_tx: std_mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    frames_captured: Arc<AtomicU64>,
    thread: Option<CaptureThread>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Result<Self> {
        // Fail early so the session reports the device as unavailable
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        info!(
            "Microphone backend initialized ({}Hz, {} channels)",
            config.sample_rate, config.channels
        );

        Ok(Self {
            config,
            frames_captured: Arc::new(AtomicU64::new(0)),
            thread: None,
        })
    }
}

fn open_stream(
    config: &AudioBackendConfig,
    tx: mpsc::Sender<AudioFrame>,
    frames_captured: Arc<AtomicU64>,
) -> Result<cpal::Stream, CaptureError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(CaptureError::NoDevice)?;

    let sample_rate = config.sample_rate;
    let channels = config.channels;

    let supported = device
        .supported_input_configs()?
        .find(|c| {
            c.channels() == channels
                && c.min_sample_rate().0 <= sample_rate
                && c.max_sample_rate().0 >= sample_rate
        })
        .ok_or(CaptureError::UnsupportedFormat { sample_rate, channels })?
        .with_sample_rate(cpal::SampleRate(sample_rate));

    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    let deliver = move |samples: Vec<i16>| {
        let frames = (samples.len() / channels as usize) as u64;
        let start = frames_captured.fetch_add(frames, Ordering::SeqCst);
        let frame = AudioFrame {
            samples,
            sample_rate,
            channels,
            timestamp_ms: start * 1000 / sample_rate as u64,
        };
        // Never block the audio thread; a full channel drops the buffer.
        if tx.try_send(frame).is_err() {
            warn!("Dropping microphone buffer: receiver full or closed");
        }
    };

    let on_error = |err: cpal::StreamError| {
        error!("cpal stream error: {err}");
    };

    let stream = match sample_format {
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| deliver(data.to_vec()),
            on_error,
            None,
        )?,
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let samples = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect();
                deliver(samples)
            },
            on_error,
            None,
        )?,
        _ => return Err(CaptureError::UnsupportedFormat { sample_rate, channels }),
    };

    stream.play()?;
    Ok(stream)
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.thread.is_some() {
            bail!("Already capturing");
        }

        info!("Starting microphone capture");

        let (tx, rx) = mpsc::channel(100);
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<Result<(), CaptureError>>(1);
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let config = self.config.clone();
        let frames_captured = Arc::clone(&self.frames_captured);

        let handle = std::thread::Builder::new()
            .name("microphone-capture".to_string())
            .spawn(move || match open_stream(&config, tx, frames_captured) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    // Either an explicit stop or the backend being dropped ends capture
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .context("Failed to spawn microphone capture thread")?;

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .context("Microphone readiness wait panicked")?
            .context("Microphone capture thread exited early")?;

        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e).context("Failed to open microphone");
        }

        self.thread = Some(CaptureThread { stop_tx, handle });
        info!("Microphone capture started");

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        info!("Stopping microphone capture");
        let _ = thread.stop_tx.send(());
        tokio::task::spawn_blocking(move || thread.handle.join())
            .await
            .context("Microphone join task panicked")?
            .map_err(|_| anyhow::anyhow!("Microphone capture thread panicked"))?;

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.thread.is_some()
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

impl Drop for MicrophoneBackend {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.stop_tx.send(());
        }
    }
}

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioFrame};

/// Writes one segment to disk as a 16-bit PCM WAV file
struct SegmentWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    sample_rate: u32,
    channels: u16,
    frames_written: u64,
}

impl SegmentWriter {
    fn create(path: &Path, sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer: Some(writer),
            sample_rate,
            channels,
            frames_written: 0,
        })
    }

    fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if frame.sample_rate != self.sample_rate || frame.channels != self.channels {
            warn!(
                "Frame format mismatch: expected {}Hz/{}ch, got {}Hz/{}ch. Dropping frame.",
                self.sample_rate, self.channels, frame.sample_rate, frame.channels
            );
            return Ok(());
        }

        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.frames_written += frame.frame_count() as u64;
        }

        Ok(())
    }

    fn finish(mut self) -> Result<u64> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }
        Ok(self.frames_written)
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}

/// Shared, lock-free view of the most recent buffer level
///
/// One probe is handed to every device of a session so the volume meter
/// keeps sampling across segment changes.
#[derive(Debug, Clone, Default)]
pub struct LevelProbe(Arc<AtomicU32>);

impl LevelProbe {
    pub fn level(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, level: f32) {
        self.0.store(level.to_bits(), Ordering::Relaxed);
    }
}

/// Frame pump running while the device is capturing
struct Pump {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<Result<SegmentWriter>>,
}

/// One backend instance bound to one segment file
///
/// `pause`/`resume` suspend and reactivate capture on the same open file.
/// `stop` finalizes the file; a stopped device cannot be resumed, the
/// session opens a new device on a new segment instead.
pub struct CaptureDevice {
    backend: Box<dyn AudioBackend>,
    writer: Option<SegmentWriter>,
    pump: Option<Pump>,
    level: LevelProbe,
    path: PathBuf,
}

impl CaptureDevice {
    /// Create the segment file; capture does not start until [`record`](Self::record)
    pub fn open(
        backend: Box<dyn AudioBackend>,
        path: &Path,
        sample_rate: u32,
        channels: u16,
        level: LevelProbe,
    ) -> Result<Self> {
        let writer = SegmentWriter::create(path, sample_rate, channels)?;

        info!("Capture device '{}' bound to {}", backend.name(), path.display());

        Ok(Self {
            backend,
            writer: Some(writer),
            pump: None,
            level,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_capturing(&self) -> bool {
        self.pump.is_some()
    }

    /// Start (or restart) capture into the open segment
    pub async fn record(&mut self) -> Result<()> {
        if self.pump.is_some() {
            return Ok(());
        }
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| anyhow!("Segment {} is already finalized", self.path.display()))?;

        let mut frames = match self.backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.writer = Some(writer);
                return Err(e).context("Failed to start audio backend");
            }
        };

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let level = self.level.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = frames.recv() => match frame {
                        Some(frame) => {
                            level.set(frame.rms());
                            writer.write_frame(&frame)?;
                        }
                        None => break,
                    },
                    _ = &mut stop_rx => break,
                }
            }

            // Frames already delivered belong to this segment
            frames.close();
            while let Ok(frame) = frames.try_recv() {
                writer.write_frame(&frame)?;
            }
            level.set(0.0);

            Ok::<_, anyhow::Error>(writer)
        });

        self.pump = Some(Pump { stop_tx, handle });
        debug!("Capture running on {}", self.path.display());
        Ok(())
    }

    /// Suspend capture, keeping the segment file open
    pub async fn pause(&mut self) -> Result<()> {
        self.halt().await?;
        debug!("Capture paused on {}", self.path.display());
        Ok(())
    }

    /// Reactivate capture on the same segment file
    pub async fn resume(&mut self) -> Result<()> {
        self.record().await
    }

    /// Stop capture and finalize the segment; returns the frames written
    pub async fn stop(mut self) -> Result<u64> {
        self.halt().await?;
        let frames = match self.writer.take() {
            Some(writer) => writer.finish()?,
            None => 0,
        };
        info!("Segment {} finalized ({} frames)", self.path.display(), frames);
        Ok(frames)
    }

    async fn halt(&mut self) -> Result<()> {
        let Some(pump) = self.pump.take() else {
            return Ok(());
        };

        if let Err(e) = self.backend.stop().await {
            warn!("Audio backend '{}' failed to stop cleanly: {}", self.backend.name(), e);
        }
        let _ = pump.stop_tx.send(());

        let writer = pump.handle.await.context("Capture pump panicked")??;
        self.writer = Some(writer);
        Ok(())
    }
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            // The pump hands the writer back on completion; dropping the
            // result finalizes the file.
            let _ = pump.stop_tx.send(());
        }
    }
}

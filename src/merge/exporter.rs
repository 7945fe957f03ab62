use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;
use tracing::{error, info};

use super::composition::Composition;
use crate::audio::AudioFile;

/// Terminal state of an export
#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Completed,
    Failed(String),
    Cancelled,
}

/// Handle to an export running in the background
pub struct ExportJob {
    rx: oneshot::Receiver<ExportStatus>,
}

impl ExportJob {
    pub fn new(rx: oneshot::Receiver<ExportStatus>) -> Self {
        Self { rx }
    }

    /// Wait for the export to finish.
    ///
    /// There is no timeout: an exporter that never reports keeps the caller
    /// waiting. An exporter that goes away without reporting counts as
    /// cancelled.
    pub async fn wait(self) -> ExportStatus {
        self.rx.await.unwrap_or(ExportStatus::Cancelled)
    }
}

/// Asynchronous transcode primitive
pub trait Exporter: Send + Sync {
    fn export(&self, composition: Composition, destination: PathBuf) -> ExportJob;
}

/// Renders a composition to 16-bit PCM WAV on the blocking pool
#[derive(Debug, Clone, Copy, Default)]
pub struct WavExporter;

impl Exporter for WavExporter {
    fn export(&self, composition: Composition, destination: PathBuf) -> ExportJob {
        let (tx, rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let status = match render(&composition, &destination) {
                Ok(()) => {
                    info!(
                        "Exported {} tracks ({}ms) to {}",
                        composition.tracks().len(),
                        composition.duration_ms(),
                        destination.display()
                    );
                    ExportStatus::Completed
                }
                Err(e) => {
                    error!("Export to {} failed: {:#}", destination.display(), e);
                    ExportStatus::Failed(format!("{:#}", e))
                }
            };
            let _ = tx.send(status);
        });

        ExportJob::new(rx)
    }
}

fn render(composition: &Composition, destination: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: composition.channels(),
        sample_rate: composition.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(destination, spec)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    let channels = composition.channels() as usize;
    let mut position: u64 = 0;

    for track in composition.tracks() {
        // Silence up to the insertion point; contiguous tracks never need it
        while position < track.insert_at {
            for _ in 0..channels {
                writer.write_sample(0i16)?;
            }
            position += 1;
        }

        let audio = AudioFile::open(&track.source)?;
        if audio.sample_rate != composition.sample_rate() || audio.channels != composition.channels() {
            bail!("{} changed format during export", track.source.display());
        }

        for &sample in &audio.samples {
            writer.write_sample(sample)?;
        }
        position += audio.frame_count();
    }

    writer.finalize().context("Failed to finalize merged WAV")?;
    Ok(())
}

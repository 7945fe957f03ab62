use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::composition::Composition;
use super::exporter::{ExportStatus, Exporter, WavExporter};
use super::MergeError;
use crate::audio::AudioFile;
use crate::session::Segment;

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub output_path: PathBuf,
    pub duration_ms: u64,
    pub segments_merged: usize,
}

/// Concatenates session segments into one artifact
///
/// `merge` resolves only after the export has finished, whatever the
/// exporter does underneath.
#[derive(Clone)]
pub struct Merger {
    exporter: Arc<dyn Exporter>,
}

impl Merger {
    pub fn new(exporter: Arc<dyn Exporter>) -> Self {
        Self { exporter }
    }

    pub async fn merge(
        &self,
        segments: &[Segment],
        output_path: &Path,
    ) -> Result<MergeOutcome, MergeError> {
        if segments.len() < 2 {
            return Err(MergeError::NotEnoughSegments(segments.len()));
        }

        info!(
            "Merging {} segments into {}",
            segments.len(),
            output_path.display()
        );

        // Fail fast before anything is written
        let mut composition: Option<Composition> = None;
        for segment in segments {
            let audio = AudioFile::probe(&segment.file_path).map_err(|e| {
                MergeError::UndecodableSegment {
                    path: segment.file_path.clone(),
                    reason: format!("{:#}", e),
                }
            })?;
            composition
                .get_or_insert_with(|| Composition::new(audio.sample_rate, audio.channels))
                .insert(&segment.file_path, &audio)?;
        }
        let Some(composition) = composition else {
            return Err(MergeError::NotEnoughSegments(0));
        };
        let duration_ms = composition.duration_ms();

        let dir = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // Removed on drop, so every failure path below cleans up after itself
        let staging = tempfile::Builder::new()
            .prefix(".merge-")
            .suffix(".wav")
            .tempfile_in(dir)?
            .into_temp_path();

        match self
            .exporter
            .export(composition, staging.to_path_buf())
            .wait()
            .await
        {
            ExportStatus::Completed => {}
            ExportStatus::Failed(reason) => return Err(MergeError::ExportFailed(reason)),
            ExportStatus::Cancelled => return Err(MergeError::ExportCancelled),
        }

        let exported_len = std::fs::metadata(&staging).map(|m| m.len()).unwrap_or(0);
        if exported_len == 0 {
            return Err(MergeError::EmptyExport);
        }

        if let Err(first) = staging.persist(output_path) {
            // Platforms that refuse to rename over an existing file
            if output_path.exists() {
                std::fs::remove_file(output_path)?;
            }
            first.path.persist(output_path).map_err(|e| e.error)?;
        }

        for segment in segments {
            if segment.file_path == output_path {
                continue;
            }
            if let Err(e) = std::fs::remove_file(&segment.file_path) {
                warn!(
                    "Failed to remove merged segment {}: {}",
                    segment.file_path.display(),
                    e
                );
            }
        }

        info!(
            "Merged {} segments ({}ms) into {}",
            segments.len(),
            duration_ms,
            output_path.display()
        );

        Ok(MergeOutcome {
            output_path: output_path.to_path_buf(),
            duration_ms,
            segments_merged: segments.len(),
        })
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new(Arc::new(WavExporter))
    }
}

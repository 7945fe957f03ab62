//! Segment merging
//!
//! Segments are probed, laid out back to back on a [`Composition`], and
//! rendered by an [`Exporter`] into a staging file that replaces the final
//! output only once the export has completed and produced data.

mod composition;
mod exporter;
mod merger;

use std::path::PathBuf;
use thiserror::Error;

pub use composition::{Composition, CompositionTrack};
pub use exporter::{ExportJob, ExportStatus, Exporter, WavExporter};
pub use merger::{MergeOutcome, Merger};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("merge needs at least two segments, got {0}")]
    NotEnoughSegments(usize),

    #[error("segment {path:?} has no decodable audio track: {reason}")]
    UndecodableSegment { path: PathBuf, reason: String },

    #[error("segment {path:?} is {found:?} (rate, channels), expected {expected:?}")]
    FormatMismatch {
        path: PathBuf,
        expected: (u32, u16),
        found: (u32, u16),
    },

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("export was cancelled")]
    ExportCancelled,

    #[error("export produced no data")]
    EmptyExport,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

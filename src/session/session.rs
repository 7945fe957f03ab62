use chrono::Utc;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::interruption::InterruptionMonitor;
use super::options::{RecordingOptions, RecordingStatus};
use super::segments::{Segment, SegmentStore};
use crate::audio::{CaptureDevice, LevelProbe, VolumeMeter};

/// The single live session, owned by the controller actor
///
/// Dropping a session releases everything it holds: the capture device
/// finalizes its segment file, the interruption monitor unsubscribes and the
/// volume meter stops polling.
pub struct RecordingSession {
    pub(crate) id: Uuid,
    pub(crate) status: RecordingStatus,
    pub(crate) options: RecordingOptions,
    pub(crate) segments: SegmentStore,
    pub(crate) device: Option<CaptureDevice>,
    pub(crate) monitor: Option<InterruptionMonitor>,
    pub(crate) meter: Option<VolumeMeter>,
    pub(crate) level: LevelProbe,
    directory: PathBuf,
    base_name: String,
}

impl RecordingSession {
    pub(crate) fn new(options: RecordingOptions, directory: PathBuf) -> Self {
        let started_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: RecordingStatus::None,
            options,
            segments: SegmentStore::new(),
            device: None,
            monitor: None,
            meter: None,
            level: LevelProbe::default(),
            directory,
            base_name: format!("recording-{}", started_at.timestamp_millis()),
        }
    }

    /// File for the segment with the given sequence number
    ///
    /// Segment #0 sits at the target path; later segments are siblings.
    pub(crate) fn segment_path(&self, sequence_number: u32) -> PathBuf {
        if sequence_number == 0 {
            self.directory.join(format!("{}.wav", self.base_name))
        } else {
            self.directory
                .join(format!("{}-segment-{:03}.wav", self.base_name, sequence_number))
        }
    }

    /// Where the finished recording lands
    pub(crate) fn target_path(&self) -> PathBuf {
        self.segment_path(0)
    }

    pub(crate) fn directory(&self) -> &Path {
        &self.directory
    }

    /// Record a newly created segment and its running device
    pub(crate) fn begin_segment(&mut self, sequence_number: u32, device: CaptureDevice) -> u32 {
        let segment = Segment {
            sequence_number,
            file_path: device.path().to_path_buf(),
            created_at: Utc::now(),
        };
        self.device = Some(device);
        self.status = RecordingStatus::Recording;
        self.segments.append(segment)
    }
}

use std::path::{Path, PathBuf};

use super::MergeError;
use crate::audio::AudioInfo;

/// A segment placed on the output timeline
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTrack {
    pub source: PathBuf,
    /// Output frame at which the segment starts
    pub insert_at: u64,
    /// Full segment length in frames (never trimmed)
    pub frames: u64,
}

/// Single output track built by back-to-back insertion
///
/// The insertion cursor starts at zero and advances by each inserted
/// segment's length, so segments never overlap and never leave a gap.
#[derive(Debug, Clone)]
pub struct Composition {
    sample_rate: u32,
    channels: u16,
    tracks: Vec<CompositionTrack>,
    cursor: u64,
}

impl Composition {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            tracks: Vec::new(),
            cursor: 0,
        }
    }

    pub fn insert(&mut self, source: &Path, info: &AudioInfo) -> Result<(), MergeError> {
        if info.sample_rate != self.sample_rate || info.channels != self.channels {
            return Err(MergeError::FormatMismatch {
                path: source.to_path_buf(),
                expected: (self.sample_rate, self.channels),
                found: (info.sample_rate, info.channels),
            });
        }

        self.tracks.push(CompositionTrack {
            source: source.to_path_buf(),
            insert_at: self.cursor,
            frames: info.frames,
        });
        self.cursor += info.frames;
        Ok(())
    }

    pub fn tracks(&self) -> &[CompositionTrack] {
        &self.tracks
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration_frames(&self) -> u64 {
        self.cursor
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            0
        } else {
            self.cursor * 1000 / self.sample_rate as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(frames: u64) -> AudioInfo {
        AudioInfo {
            sample_rate: 16000,
            channels: 1,
            frames,
        }
    }

    #[test]
    fn test_segments_are_placed_back_to_back() {
        let mut composition = Composition::new(16000, 1);
        composition.insert(Path::new("a.wav"), &info(32000)).unwrap();
        composition.insert(Path::new("b.wav"), &info(48000)).unwrap();
        composition.insert(Path::new("c.wav"), &info(0)).unwrap();

        let starts: Vec<u64> = composition.tracks().iter().map(|t| t.insert_at).collect();
        assert_eq!(starts, vec![0, 32000, 80000]);
        assert_eq!(composition.duration_frames(), 80000);
        assert_eq!(composition.duration_ms(), 5000);
    }

    #[test]
    fn test_format_mismatch_is_rejected() {
        let mut composition = Composition::new(16000, 1);
        let stereo = AudioInfo {
            sample_rate: 16000,
            channels: 2,
            frames: 100,
        };

        let err = composition.insert(Path::new("s.wav"), &stereo).unwrap_err();
        assert!(matches!(err, MergeError::FormatMismatch { .. }));
        assert!(composition.tracks().is_empty());
    }
}

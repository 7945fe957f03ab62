use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One contiguous run of captured audio stored as its own file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub sequence_number: u32,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Append-only, ordered segments of one session
///
/// Sequence numbers are reserved before the segment file is created; a
/// failed create consumes its number and appends nothing.
#[derive(Debug, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    next_sequence: u32,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the sequence number for the next create attempt
    pub fn next_sequence_number(&mut self) -> u32 {
        let n = self.next_sequence;
        self.next_sequence += 1;
        n
    }

    pub fn append(&mut self, segment: Segment) -> u32 {
        debug_assert!(
            self.segments
                .last()
                .map_or(true, |last| last.sequence_number < segment.sequence_number),
            "segment sequence numbers must increase"
        );
        if segment.sequence_number >= self.next_sequence {
            self.next_sequence = segment.sequence_number + 1;
        }
        let n = segment.sequence_number;
        self.segments.push(segment);
        n
    }

    pub fn all(&self) -> &[Segment] {
        &self.segments
    }

    pub fn count(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(n: u32) -> Segment {
        Segment {
            sequence_number: n,
            file_path: PathBuf::from(format!("/tmp/seg-{n}.wav")),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_keeps_creation_order() {
        let mut store = SegmentStore::new();
        let a = store.next_sequence_number();
        store.append(segment(a));
        let b = store.next_sequence_number();
        store.append(segment(b));

        assert_eq!(store.count(), 2);
        let numbers: Vec<u32> = store.all().iter().map(|s| s.sequence_number).collect();
        assert_eq!(numbers, vec![0, 1]);
    }

    #[test]
    fn test_failed_create_leaves_gap() {
        let mut store = SegmentStore::new();
        let first = store.next_sequence_number();
        store.append(segment(first));
        let _abandoned = store.next_sequence_number();
        let third = store.next_sequence_number();
        store.append(segment(third));

        assert_eq!(store.count(), 2);
        assert_eq!(store.all()[1].sequence_number, 2);
    }
}

// Integration tests for audio file probing and decoding
//
// Fixtures are generated into a temp dir with hound, so each test knows the
// exact format and length it should read back.

mod common;

use anyhow::Result;
use common::write_wav;
use std::path::PathBuf;
use tempfile::TempDir;
use voice_recorder::AudioFile;

#[test]
fn test_audio_file_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("sample.wav");
    write_wav(&path, 1500, 1, 42)?;

    let audio = AudioFile::open(&path)?;

    assert!((audio.duration_seconds - 1.5).abs() < 1e-9);
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 24000);
    assert!(audio.samples.iter().all(|&s| s == 42));
    assert!(audio.path.contains("sample.wav"));

    Ok(())
}

#[test]
fn test_probe_matches_decode() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("stereo.wav");
    write_wav(&path, 250, 2, -7)?;

    let info = AudioFile::probe(&path)?;
    let audio = AudioFile::open(&path)?;

    assert_eq!(info.sample_rate, audio.sample_rate);
    assert_eq!(info.channels, 2);
    assert_eq!(info.frames, audio.frame_count());
    assert_eq!(info.duration_ms(), 250);

    // Interleaved [L, R, L, R, ...]
    assert_eq!(audio.samples.len() % 2, 0);

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");

    assert!(AudioFile::open(&path).is_err(), "Opening nonexistent file should fail");
    assert!(AudioFile::probe(&path).is_err(), "Probing nonexistent file should fail");
}

#[test]
fn test_garbage_is_not_audio() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("garbage.wav");
    std::fs::write(&path, b"RIFF but not really a wave file at all")?;

    assert!(AudioFile::probe(&path).is_err());

    let empty = temp_dir.path().join("empty.wav");
    std::fs::write(&empty, b"")?;
    assert!(AudioFile::probe(&empty).is_err());

    Ok(())
}

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

/// Stream properties of the first decodable audio track in a file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Sample frames (samples per channel)
    pub frames: u64,
}

impl AudioInfo {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            0
        } else {
            self.frames * 1000 / self.sample_rate as u64
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames as f64 / self.sample_rate as f64
        }
    }
}

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

struct OpenTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    info: AudioInfo,
}

fn open_track(path: &Path) -> Result<OpenTrack> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Unrecognised audio container: {}", path.display()))?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("No audio track in {}", path.display()))?;

    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| anyhow!("Unknown sample rate in {}", path.display()))?;
    let channels = params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| anyhow!("Unknown channel layout in {}", path.display()))?;
    let frames = params
        .n_frames
        .ok_or_else(|| anyhow!("Unknown duration for {}", path.display()))?;

    let decoder = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .with_context(|| format!("No decoder for {}", path.display()))?;

    Ok(OpenTrack {
        track_id: track.id,
        info: AudioInfo {
            sample_rate,
            channels,
            frames,
        },
        format,
        decoder,
    })
}

impl AudioFile {
    /// Probe a file for a decodable audio track without decoding it
    pub fn probe(path: impl AsRef<Path>) -> Result<AudioInfo> {
        let path = path.as_ref();
        let track = open_track(path)?;
        debug!(
            "Probed {}: {} frames, {}Hz, {} channels",
            path.display(),
            track.info.frames,
            track.info.sample_rate,
            track.info.channels
        );
        Ok(track.info)
    }

    /// Decode the first audio track to interleaved i16 samples
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let OpenTrack {
            mut format,
            mut decoder,
            track_id,
            info,
        } = open_track(path)?;

        let mut samples: Vec<i16> = Vec::with_capacity((info.frames * info.channels as u64) as usize);

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e).context("Failed to read audio packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = decoder
                .decode(&packet)
                .context("Failed to decode audio packet")?;
            let spec = *decoded.spec();
            let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        let duration_seconds =
            samples.len() as f64 / (info.sample_rate as f64 * info.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            info.sample_rate,
            info.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: info.sample_rate,
            channels: info.channels,
            samples,
        })
    }

    pub fn frame_count(&self) -> u64 {
        if self.channels == 0 {
            0
        } else {
            (self.samples.len() / self.channels as usize) as u64
        }
    }
}

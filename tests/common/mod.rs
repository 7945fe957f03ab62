// Shared fixtures for integration tests
//
// ScriptedBackend never produces audio on its own: tests push exact
// durations of captured audio through a FrameInjector, which makes segment
// lengths deterministic.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc, oneshot};
use voice_recorder::audio::{AudioBackend, AudioBackendConfig, AudioFrame, BackendFactory};
use voice_recorder::merge::{Composition, ExportJob, ExportStatus, Exporter};
use voice_recorder::session::InterruptionSource;
use voice_recorder::{
    FixedDirectories, InterruptionHub, RawInterruption, RecorderEvent, RecordingController,
};

pub const SAMPLE_RATE: u32 = 16000;
pub const FRAME_MS: u64 = 100;

pub fn backend_config() -> AudioBackendConfig {
    AudioBackendConfig {
        sample_rate: SAMPLE_RATE,
        channels: 1,
        buffer_duration_ms: FRAME_MS,
    }
}

#[derive(Clone, Default)]
pub struct FrameInjector {
    active: Arc<Mutex<Option<mpsc::Sender<AudioFrame>>>>,
    opened: Arc<AtomicUsize>,
    fail_next_open: Arc<AtomicBool>,
}

impl FrameInjector {
    /// Deliver `ms` milliseconds of audio to the running backend
    pub async fn capture_ms(&self, ms: u64) -> Result<()> {
        let tx = self
            .active
            .lock()
            .unwrap()
            .clone()
            .context("no backend is capturing")?;

        let samples_per_frame = (SAMPLE_RATE as u64 * FRAME_MS / 1000) as usize;
        for i in 0..ms / FRAME_MS {
            let frame = AudioFrame {
                samples: vec![1000i16; samples_per_frame],
                sample_rate: SAMPLE_RATE,
                channels: 1,
                timestamp_ms: i * FRAME_MS,
            };
            tx.send(frame).await?;
        }
        Ok(())
    }

    pub fn is_capturing(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    pub fn backends_created(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Make the next backend creation fail (device unavailable)
    pub fn fail_next_open(&self) {
        self.fail_next_open.store(true, Ordering::SeqCst);
    }
}

pub struct ScriptedBackend {
    injector: FrameInjector,
    capturing: bool,
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(256);
        *self.injector.active.lock().unwrap() = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if self.capturing {
            *self.injector.active.lock().unwrap() = None;
            self.capturing = false;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedBackendFactory {
    pub injector: FrameInjector,
}

impl BackendFactory for ScriptedBackendFactory {
    fn create(&self, _config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        if self.injector.fail_next_open.swap(false, Ordering::SeqCst) {
            bail!("input device is claimed by another application");
        }
        self.injector.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedBackend {
            injector: self.injector.clone(),
            capturing: false,
        }))
    }
}

/// Exporter that reports failure without writing anything
pub struct FailingExporter {
    reason: String,
}

impl FailingExporter {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Exporter for FailingExporter {
    fn export(&self, _composition: Composition, _destination: PathBuf) -> ExportJob {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(ExportStatus::Failed(self.reason.clone()));
        ExportJob::new(rx)
    }
}

/// Interruption source whose subscription always fails
pub struct UnavailableInterruptions;

impl InterruptionSource for UnavailableInterruptions {
    fn subscribe(&self) -> Result<broadcast::Receiver<RawInterruption>> {
        Err(anyhow!("audio session notifications are unavailable"))
    }
}

/// Controller wired to a scripted backend, an interruption hub and a temp dir
pub struct TestRecorder {
    pub controller: RecordingController,
    pub hub: InterruptionHub,
    pub injector: FrameInjector,
    pub temp_dir: TempDir,
}

impl TestRecorder {
    pub fn new() -> Result<Self> {
        Self::with(|builder| builder)
    }

    pub fn with(
        configure: impl FnOnce(voice_recorder::session::ControllerBuilder) -> voice_recorder::session::ControllerBuilder,
    ) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let hub = InterruptionHub::new();
        let injector = FrameInjector::default();

        let builder = RecordingController::builder(
            Arc::new(ScriptedBackendFactory {
                injector: injector.clone(),
            }),
            Arc::new(FixedDirectories::new(temp_dir.path())),
        )
        .backend_config(backend_config())
        .interruptions(Arc::new(hub.clone()));

        Ok(Self {
            controller: configure(builder).spawn(),
            hub,
            injector,
            temp_dir,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// WAV files directly inside `dir`
pub fn wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "wav"))
        .collect();
    files.sort();
    Ok(files)
}

/// Wait for the next event matching `want`, skipping others
pub async fn expect_event(
    events: &mut broadcast::Receiver<RecorderEvent>,
    want: impl Fn(&RecorderEvent) -> bool,
) -> Result<RecorderEvent> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if want(&event) => return Ok(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => bail!("event channel closed"),
            }
        }
    })
    .await
    .context("timed out waiting for recorder event")?
}

/// Write a 16-bit PCM WAV of `ms` milliseconds filled with `value`
pub fn write_wav(path: &Path, ms: u64, channels: u16, value: i16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = SAMPLE_RATE as u64 * ms / 1000;
    for _ in 0..frames * channels as u64 {
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}

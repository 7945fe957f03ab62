//! Recording state machine.
//!
//! A [`RecordingController`] is a cheap, cloneable handle. Every operation is
//! sent as a [`Command`] to one actor task that owns the live
//! [`RecordingSession`]; interruption signals arrive on the same queue, so
//! caller operations and interruptions never mutate the session concurrently.
//!
//! ```text
//! NONE ──start──▶ RECORDING ──pause──▶ PAUSED ──resume──▶ RECORDING
//!                 RECORDING ──interruption began──▶ INTERRUPTED
//!                 INTERRUPTED ──resume (new segment)──▶ RECORDING
//! any ≠ NONE ──stop (merge if >1 segment)──▶ NONE
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::RecorderEvent;
use super::interruption::{InterruptionHub, InterruptionMonitor, InterruptionSignal, InterruptionSource};
use super::options::{RecordingData, RecordingOptions, RecordingStatus, RecordingValue};
use super::session::RecordingSession;
use crate::audio::{AudioBackendConfig, AudioFile, BackendFactory, CaptureDevice, LevelProbe, VolumeMeter};
use crate::error::RecorderError;
use crate::merge::Merger;
use crate::permissions::{PermissionGate, StaticPermission};
use crate::storage::{self, DirectoryResolver};

pub(crate) enum Command {
    Start {
        options: RecordingOptions,
        reply: oneshot::Sender<Result<(), RecorderError>>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Resume {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<Result<RecordingData, RecorderError>>,
    },
    Status {
        reply: oneshot::Sender<RecordingStatus>,
    },
    SegmentCount {
        reply: oneshot::Sender<usize>,
    },
    Interruption {
        session_id: Uuid,
        signal: InterruptionSignal,
    },
}

/// Opens capture devices on segment files
struct DeviceOpener {
    factory: Arc<dyn BackendFactory>,
    config: AudioBackendConfig,
}

impl DeviceOpener {
    async fn open(&self, path: PathBuf, level: LevelProbe) -> Result<CaptureDevice, RecorderError> {
        let unavailable = |e: anyhow::Error| RecorderError::DeviceUnavailable(format!("{:#}", e));

        let backend = self.factory.create(&self.config).map_err(unavailable)?;
        let mut device = CaptureDevice::open(
            backend,
            &path,
            self.config.sample_rate,
            self.config.channels,
            level,
        )
        .map_err(unavailable)?;

        if let Err(e) = device.record().await {
            error!("Capture failed to start on {}: {:#}", path.display(), e);
            if let Err(e) = device.stop().await {
                warn!("Failed to finalize abandoned segment: {:#}", e);
            }
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove abandoned segment {}: {}", path.display(), e);
            }
            return Err(unavailable(e));
        }

        Ok(device)
    }
}

/// Builder for [`RecordingController`]
pub struct ControllerBuilder {
    factory: Arc<dyn BackendFactory>,
    directories: Arc<dyn DirectoryResolver>,
    backend_config: AudioBackendConfig,
    interruptions: Arc<dyn InterruptionSource>,
    permissions: Arc<dyn PermissionGate>,
    merger: Merger,
    meter_interval: Option<Duration>,
}

impl ControllerBuilder {
    pub fn backend_config(mut self, config: AudioBackendConfig) -> Self {
        self.backend_config = config;
        self
    }

    pub fn interruptions(mut self, source: Arc<dyn InterruptionSource>) -> Self {
        self.interruptions = source;
        self
    }

    pub fn permissions(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.permissions = gate;
        self
    }

    pub fn merger(mut self, merger: Merger) -> Self {
        self.merger = merger;
        self
    }

    /// Emit [`RecorderEvent::VolumeChanged`] on this interval while a session is live
    pub fn volume_metering(mut self, interval: Duration) -> Self {
        self.meter_interval = Some(interval);
        self
    }

    /// Spawn the controller actor on the current tokio runtime
    pub fn spawn(self) -> RecordingController {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);

        let actor = SessionActor {
            devices: DeviceOpener {
                factory: self.factory,
                config: self.backend_config,
            },
            directories: self.directories,
            interruptions: self.interruptions,
            permissions: self.permissions,
            merger: self.merger,
            meter_interval: self.meter_interval,
            events: events.clone(),
            signals: commands_tx.downgrade(),
            session: None,
        };
        tokio::spawn(actor.run(commands_rx));

        RecordingController {
            commands: commands_tx,
            events,
        }
    }
}

/// Handle to the recording state machine
#[derive(Clone)]
pub struct RecordingController {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<RecorderEvent>,
}

impl RecordingController {
    pub fn builder(
        factory: Arc<dyn BackendFactory>,
        directories: Arc<dyn DirectoryResolver>,
    ) -> ControllerBuilder {
        ControllerBuilder {
            factory,
            directories,
            backend_config: AudioBackendConfig::default(),
            interruptions: Arc::new(InterruptionHub::new()),
            permissions: Arc::new(StaticPermission::granted()),
            merger: Merger::default(),
            meter_interval: None,
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| RecorderError::ControllerClosed)?;
        rx.await.map_err(|_| RecorderError::ControllerClosed)
    }

    /// Start a new session; fails if one is already live
    pub async fn start(&self, options: RecordingOptions) -> Result<(), RecorderError> {
        self.request(|reply| Command::Start { options, reply }).await?
    }

    /// Suspend capture; `false` unless currently recording
    pub async fn pause(&self) -> bool {
        self.request(|reply| Command::Pause { reply })
            .await
            .unwrap_or(false)
    }

    /// Resume from paused or interrupted; `false` otherwise
    pub async fn resume(&self) -> bool {
        self.request(|reply| Command::Resume { reply })
            .await
            .unwrap_or(false)
    }

    /// Stop the session, merging segments if needed
    ///
    /// Resolves only once any merge has finished. The session is gone
    /// afterwards whether or not this succeeds.
    pub async fn stop(&self) -> Result<RecordingData, RecorderError> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    pub async fn get_current_status(&self) -> RecordingStatus {
        self.request(|reply| Command::Status { reply })
            .await
            .unwrap_or_default()
    }

    /// Segments of the live session (0 when idle)
    pub async fn segment_count(&self) -> usize {
        self.request(|reply| Command::SegmentCount { reply })
            .await
            .unwrap_or(0)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RecorderEvent> {
        self.events.subscribe()
    }
}

struct SessionActor {
    devices: DeviceOpener,
    directories: Arc<dyn DirectoryResolver>,
    interruptions: Arc<dyn InterruptionSource>,
    permissions: Arc<dyn PermissionGate>,
    merger: Merger,
    meter_interval: Option<Duration>,
    events: broadcast::Sender<RecorderEvent>,
    /// Weak so monitors never keep the actor alive after the last handle
    signals: mpsc::WeakUnboundedSender<Command>,
    session: Option<RecordingSession>,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("Recording controller started");

        while let Some(command) = commands.recv().await {
            match command {
                Command::Start { options, reply } => {
                    let _ = reply.send(self.start(options).await);
                }
                Command::Pause { reply } => {
                    let _ = reply.send(self.pause().await);
                }
                Command::Resume { reply } => {
                    let _ = reply.send(self.resume().await);
                }
                Command::Stop { reply } => {
                    let _ = reply.send(self.stop().await);
                }
                Command::Status { reply } => {
                    let status = self.session.as_ref().map(|s| s.status).unwrap_or_default();
                    let _ = reply.send(status);
                }
                Command::SegmentCount { reply } => {
                    let count = self.session.as_ref().map_or(0, |s| s.segments.count());
                    let _ = reply.send(count);
                }
                Command::Interruption { session_id, signal } => {
                    self.on_interruption(session_id, signal).await;
                }
            }
        }

        if let Some(session) = self.session.take() {
            warn!("Controller shut down with session {} still live", session.id);
        }
        debug!("Recording controller stopped");
    }

    async fn start(&mut self, options: RecordingOptions) -> Result<(), RecorderError> {
        if let Some(session) = &self.session {
            warn!("Start requested while session {} is live", session.id);
            return Err(RecorderError::AlreadyRecording);
        }
        if !self.permissions.has_permission() {
            return Err(RecorderError::PermissionDenied);
        }

        let directory = self
            .directories
            .resolve(&options)
            .map_err(RecorderError::Storage)?;
        let mut session = RecordingSession::new(options, directory);

        let sequence = session.segments.next_sequence_number();
        let device = self
            .devices
            .open(session.segment_path(sequence), session.level.clone())
            .await?;
        session.begin_segment(sequence, device);

        let signals = self.signals.clone();
        match InterruptionMonitor::subscribe(self.interruptions.as_ref(), session.id, signals) {
            Ok(monitor) => session.monitor = Some(monitor),
            Err(e) => {
                error!("Interruption subscription failed: {:#}", e);
                if let Some(device) = session.device.take() {
                    let path = device.path().to_path_buf();
                    if let Err(e) = device.stop().await {
                        warn!("Failed to finalize abandoned segment: {:#}", e);
                    }
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!("Failed to remove abandoned segment {}: {}", path.display(), e);
                    }
                }
                return Err(RecorderError::DeviceUnavailable(format!(
                    "interruption subscription failed: {:#}",
                    e
                )));
            }
        }

        if let Some(interval) = self.meter_interval {
            session.meter = Some(VolumeMeter::start(
                session.level.clone(),
                interval,
                self.events.clone(),
            ));
        }

        info!(
            "Recording session {} started in {}",
            session.id,
            session.directory().display()
        );
        self.session = Some(session);
        Ok(())
    }

    async fn pause(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.status != RecordingStatus::Recording {
            debug!("Pause ignored in {:?}", session.status);
            return false;
        }
        let Some(device) = session.device.as_mut() else {
            return false;
        };

        match device.pause().await {
            Ok(()) => {
                session.status = RecordingStatus::Paused;
                info!("Recording session {} paused", session.id);
                true
            }
            Err(e) => {
                error!("Failed to pause capture: {:#}", e);
                false
            }
        }
    }

    async fn resume(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match session.status {
            RecordingStatus::Paused => {
                let Some(device) = session.device.as_mut() else {
                    return false;
                };
                match device.resume().await {
                    Ok(()) => {
                        session.status = RecordingStatus::Recording;
                        info!("Recording session {} resumed", session.id);
                        true
                    }
                    Err(e) => {
                        error!("Failed to resume capture: {:#}", e);
                        false
                    }
                }
            }
            RecordingStatus::Interrupted => {
                // The interrupted device was force-stopped; continue in a new segment
                let sequence = session.segments.next_sequence_number();
                match self
                    .devices
                    .open(session.segment_path(sequence), session.level.clone())
                    .await
                {
                    Ok(device) => {
                        session.begin_segment(sequence, device);
                        info!(
                            "Recording session {} resumed after interruption in segment #{}",
                            session.id, sequence
                        );
                        true
                    }
                    Err(e) => {
                        error!("Failed to open segment #{}: {}", sequence, e);
                        false
                    }
                }
            }
            status => {
                debug!("Resume ignored in {:?}", status);
                false
            }
        }
    }

    async fn on_interruption(&mut self, session_id: Uuid, signal: InterruptionSignal) {
        let Some(session) = self.session.as_mut() else {
            debug!("Interruption {:?} ignored: no session", signal);
            return;
        };
        if session.id != session_id {
            debug!("Dropping {:?} from previous session {}", signal, session_id);
            return;
        }

        match (signal, session.status) {
            (InterruptionSignal::Began, RecordingStatus::Recording) => {
                if let Some(device) = session.device.take() {
                    if let Err(e) = device.stop().await {
                        warn!("Interrupted device did not finalize cleanly: {:#}", e);
                    }
                }
                session.status = RecordingStatus::Interrupted;
                info!("Recording session {} interrupted", session.id);
                let _ = self.events.send(RecorderEvent::InterruptionBegan);
            }
            (InterruptionSignal::Ended, RecordingStatus::Interrupted) => {
                info!("Interruption ended; session {} waits for resume or stop", session.id);
                let _ = self.events.send(RecorderEvent::InterruptionEnded);
            }
            (signal, status) => {
                debug!("Interruption {:?} ignored in {:?}", signal, status);
            }
        }
    }

    async fn stop(&mut self) -> Result<RecordingData, RecorderError> {
        let Some(mut session) = self.session.take() else {
            return Err(RecorderError::NotRecording);
        };

        info!(
            "Stopping recording session {} ({} segments)",
            session.id,
            session.segments.count()
        );

        if let Some(device) = session.device.take() {
            if let Err(e) = device.stop().await {
                warn!("Capture device did not finalize cleanly: {:#}", e);
            }
        }
        if let Some(monitor) = session.monitor.take() {
            monitor.unsubscribe().await;
        }
        if let Some(meter) = session.meter.take() {
            meter.stop();
        }

        let target = session.target_path();
        if session.segments.count() > 1 {
            self.merger
                .merge(session.segments.all(), &target)
                .await
                .map_err(|e| {
                    error!("Merge failed for session {}: {}", session.id, e);
                    RecorderError::MergeFailed(e.to_string())
                })?;
        }

        let audio = AudioFile::probe(&target).map_err(|e| {
            error!("Recording {} unreadable: {:#}", target.display(), e);
            RecorderError::EmptyOrCorruptRecording
        })?;

        let value = if session.options.output_location.is_explicit() {
            let path = storage::relative_output_path(&session.options, &target)
                .ok_or(RecorderError::EmptyOrCorruptRecording)?;
            RecordingValue::Path { path }
        } else {
            let base64 = storage::encode_inline(&target).map_err(|e| {
                error!("Failed to encode recording: {:#}", e);
                RecorderError::EmptyOrCorruptRecording
            })?;
            RecordingValue::Inline { base64 }
        };

        info!(
            "Recording session {} finished: {} ({}ms)",
            session.id,
            target.display(),
            audio.duration_ms()
        );

        Ok(RecordingData {
            value,
            duration_ms: audio.duration_ms(),
            mime_type: storage::mime_type_for(&target).to_string(),
        })
    }
}

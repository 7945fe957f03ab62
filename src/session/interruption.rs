//! Audio-interruption delivery.
//!
//! The environment publishes raw notifications (a phone call claiming the
//! microphone, another app taking the input) through an
//! [`InterruptionSource`]. For the lifetime of one session an
//! [`InterruptionMonitor`] translates them into [`InterruptionSignal`]s and
//! queues them on the controller's command channel, so they are applied in
//! the same serialized context as caller operations.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::controller::Command;

/// Notification as delivered by the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawInterruption {
    Began,
    Ended {
        /// Environment hint that resuming is appropriate; never acted on
        #[serde(default)]
        should_resume: bool,
    },
}

/// Abstract signal consumed by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionSignal {
    Began,
    Ended,
}

impl From<RawInterruption> for InterruptionSignal {
    fn from(raw: RawInterruption) -> Self {
        match raw {
            RawInterruption::Began => InterruptionSignal::Began,
            RawInterruption::Ended { .. } => InterruptionSignal::Ended,
        }
    }
}

/// Environment channel carrying raw interruption notifications
pub trait InterruptionSource: Send + Sync {
    fn subscribe(&self) -> Result<broadcast::Receiver<RawInterruption>>;
}

/// In-process interruption channel
///
/// Platform glue, the HTTP surface and tests post notifications here.
#[derive(Debug, Clone)]
pub struct InterruptionHub {
    tx: broadcast::Sender<RawInterruption>,
}

impl InterruptionHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Publish a notification; returns how many subscribers received it
    pub fn post(&self, notification: RawInterruption) -> usize {
        debug!("Posting interruption notification: {:?}", notification);
        self.tx.send(notification).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for InterruptionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptionSource for InterruptionHub {
    fn subscribe(&self) -> Result<broadcast::Receiver<RawInterruption>> {
        Ok(self.tx.subscribe())
    }
}

/// Per-session subscription forwarding signals to the controller
///
/// Released exactly once: either by [`unsubscribe`](Self::unsubscribe) or,
/// on early exit paths, by `Drop`.
pub struct InterruptionMonitor {
    session_id: Uuid,
    task: Option<JoinHandle<()>>,
}

impl InterruptionMonitor {
    pub(crate) fn subscribe(
        source: &dyn InterruptionSource,
        session_id: Uuid,
        commands: mpsc::WeakUnboundedSender<Command>,
    ) -> Result<Self> {
        let mut notifications = source.subscribe()?;

        let task = tokio::spawn(async move {
            loop {
                let raw = match notifications.recv().await {
                    Ok(raw) => raw,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Interruption monitor lagged, {} notifications lost", missed);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                if let RawInterruption::Ended { should_resume: true } = raw {
                    debug!("Environment suggests resuming; leaving that to the caller");
                }

                // The controller is gone once no strong sender remains
                let Some(sender) = commands.upgrade() else {
                    break;
                };
                let signal = InterruptionSignal::from(raw);
                if sender
                    .send(Command::Interruption { session_id, signal })
                    .is_err()
                {
                    break;
                }
            }
        });

        info!("Interruption monitor subscribed for session {}", session_id);

        Ok(Self {
            session_id,
            task: Some(task),
        })
    }

    /// Cancel the subscription and wait until it is released
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("Interruption monitor unsubscribed for session {}", self.session_id);
        }
    }
}

impl Drop for InterruptionMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

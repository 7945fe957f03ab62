// Volume metering: a timer-driven sampling loop over the session's level
// probe. It holds no session state; it only reads the probe and emits.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use super::device::LevelProbe;
use crate::session::RecorderEvent;

pub struct VolumeMeter {
    task: JoinHandle<()>,
}

impl VolumeMeter {
    pub fn start(
        probe: LevelProbe,
        interval: Duration,
        events: broadcast::Sender<RecorderEvent>,
    ) -> Self {
        debug!("Volume meter polling every {:?}", interval);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                // No subscribers is not an error for a meter
                let _ = events.send(RecorderEvent::VolumeChanged {
                    level: probe.level(),
                });
            }
        });

        Self { task }
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for VolumeMeter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

//! Flight and detection screen session
//!
//! A `HudSession` exclusively owns the handles of the drone it was opened
//! for: the drone itself, its frame sampler and the watcher tasks. Everything
//! the screen needs to show arrives as [`HudEvent`]s.

use crate::error::PilotError;
use crate::piloting::{apply_left_stick, apply_right_stick, ButtonIcon, StickPosition, TakeoffButton};
use crate::sdk::{Drone, DroneSdk};
use anafi_eye::{Detector, EyeConfig, FrameSampler, OverlayEvent, OverlayProjector, Size};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum HudEvent {
    TakeoffButton(TakeoffButton),
    Overlay(OverlayEvent),
    /// The drone went away; the screen should close.
    Dismissed,
}

pub struct HudSession {
    drone: Arc<dyn Drone>,
    sampler: Option<FrameSampler>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HudSession {
    /// Open the session for drone `uid`. Must be called from within a tokio
    /// runtime. The overlay loop only starts when the drone already exposes
    /// a live stream that agrees to play.
    pub fn open(
        sdk: &dyn DroneSdk,
        uid: &str,
        detector: Arc<dyn Detector>,
        projector: OverlayProjector,
        viewport: Size,
        config: &EyeConfig,
    ) -> Result<(Self, mpsc::Receiver<HudEvent>), PilotError> {
        let drone = sdk.drone(uid).ok_or_else(|| PilotError::DroneNotFound(uid.to_string()))?;
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let mut tasks = vec![
            tokio::spawn(watch_removal(drone.clone(), tx.clone())),
            tokio::spawn(watch_piloting(drone.clone(), tx.clone())),
        ];

        let mut sampler = None;
        match drone.live_stream() {
            Some(stream) if stream.play() => {
                let (frames, overlays) = FrameSampler::start(stream, detector, projector, viewport, config);
                tasks.push(tokio::spawn(forward_overlays(overlays, tx)));
                sampler = Some(frames);
            }
            Some(_) => warn!("Live stream of drone {} refused to play", uid),
            None => warn!("Drone {} has no live stream, overlay disabled", uid),
        }

        info!("HUD session opened for drone {}", uid);
        let session = Self {
            drone,
            sampler,
            tasks: Mutex::new(tasks),
        };
        Ok((session, rx))
    }

    pub fn uid(&self) -> &str {
        self.drone.uid()
    }

    pub fn has_overlay(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn take_off_land(&self) -> Result<(), PilotError> {
        let piloting = self
            .drone
            .piloting()
            .ok_or_else(|| PilotError::PilotingUnavailable(self.uid().to_string()))?;
        piloting.smart_take_off_land();
        Ok(())
    }

    /// Pitch and roll. Returns false when nothing was sent.
    pub fn left_stick(&self, position: StickPosition) -> bool {
        self.drone
            .piloting()
            .map(|piloting| apply_left_stick(piloting.as_ref(), position))
            .unwrap_or(false)
    }

    /// Vertical speed and yaw. Returns false when nothing was sent.
    pub fn right_stick(&self, position: StickPosition) -> bool {
        self.drone
            .piloting()
            .map(|piloting| apply_right_stick(piloting.as_ref(), position))
            .unwrap_or(false)
    }

    pub fn set_viewport(&self, viewport: Size) {
        if let Some(sampler) = &self.sampler {
            sampler.set_viewport(viewport);
        }
    }

    pub fn close(&self) {
        if let Some(sampler) = &self.sampler {
            sampler.stop();
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        debug!("HUD session closed for drone {}", self.uid());
    }
}

impl Drop for HudSession {
    fn drop(&mut self) {
        self.close();
    }
}

async fn watch_removal(drone: Arc<dyn Drone>, events: mpsc::Sender<HudEvent>) {
    let mut states = drone.subscribe_state();
    while states.changed().await.is_ok() {}
    info!("Drone {} removed, dismissing HUD", drone.uid());
    let _ = events.send(HudEvent::Dismissed).await;
}

async fn watch_piloting(drone: Arc<dyn Drone>, events: mpsc::Sender<HudEvent>) {
    let mut snapshots = drone.subscribe_piloting();
    let mut icon: Option<ButtonIcon> = None;
    loop {
        let snapshot = *snapshots.borrow_and_update();
        let button = TakeoffButton::for_snapshot(snapshot.as_ref(), icon);
        icon = button.icon;
        if events.send(HudEvent::TakeoffButton(button)).await.is_err() {
            break;
        }
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

async fn forward_overlays(mut overlays: mpsc::Receiver<OverlayEvent>, events: mpsc::Sender<HudEvent>) {
    while let Some(event) = overlays.recv().await {
        if events.send(HudEvent::Overlay(event)).await.is_err() {
            break;
        }
    }
}

//! Periodic frame sampling and overlay production
//!
//! Every period the sampler takes a snapshot of the live stream, runs the
//! detector on the blocking pool, projects the result onto the current
//! viewport and sends an [`OverlayEvent`] downstream.

use crate::config::EyeConfig;
use crate::detection::{Detection, OverlayItem};
use crate::error::VisionError;
use crate::geometry::Size;
use crate::projector::OverlayProjector;
use async_trait::async_trait;
use image::RgbaImage;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Source of still frames taken from a live video stream.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Current frame, or `None` when nothing has been decoded yet.
    async fn snapshot(&self) -> Option<RgbaImage>;

    /// Start playback. Returns false when the stream refused to play.
    fn play(&self) -> bool {
        true
    }
}

/// On-device detection model.
pub trait Detector: Send + Sync {
    /// Run the model on a frame. `Ok(None)` means the model produced nothing
    /// for this frame; the previous overlay is left as is.
    fn detect(&self, frame: &RgbaImage) -> Result<Option<Vec<Detection>>, VisionError>;
}

/// Overlay change for one sampled frame
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Updated { frame: u64, items: Vec<OverlayItem> },
    /// The model ran and found nothing; the previous overlay must go.
    Cleared { frame: u64 },
}

impl OverlayEvent {
    pub fn frame(&self) -> u64 {
        match self {
            OverlayEvent::Updated { frame, .. } | OverlayEvent::Cleared { frame } => *frame,
        }
    }

    pub fn items(&self) -> &[OverlayItem] {
        match self {
            OverlayEvent::Updated { items, .. } => items,
            OverlayEvent::Cleared { .. } => &[],
        }
    }
}

/// Handle on a running sampling loop. Dropping it stops the loop.
pub struct FrameSampler {
    viewport: Arc<RwLock<Size>>,
    is_running: Arc<RwLock<bool>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FrameSampler {
    /// Spawn the sampling loop on the current tokio runtime.
    pub fn start(
        source: Arc<dyn FrameSource>,
        detector: Arc<dyn Detector>,
        projector: OverlayProjector,
        viewport: Size,
        config: &EyeConfig,
    ) -> (Self, mpsc::Receiver<OverlayEvent>) {
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let viewport = Arc::new(RwLock::new(viewport));
        let is_running = Arc::new(RwLock::new(true));
        let period = config.sample_period();

        let handle = tokio::spawn(run_loop(
            source,
            detector,
            projector,
            viewport.clone(),
            is_running.clone(),
            period,
            tx,
        ));
        info!("Frame sampler started, one frame every {:?}", period);

        let sampler = Self {
            viewport,
            is_running,
            handle: Mutex::new(Some(handle)),
        };
        (sampler, rx)
    }

    /// Change the viewport used for subsequent frames.
    pub fn set_viewport(&self, viewport: Size) {
        *self.viewport.write() = viewport;
    }

    pub fn viewport(&self) -> Size {
        *self.viewport.read()
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }

    pub fn stop(&self) {
        *self.is_running.write() = false;
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            info!("Frame sampler stopped");
        }
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    source: Arc<dyn FrameSource>,
    detector: Arc<dyn Detector>,
    projector: OverlayProjector,
    viewport: Arc<RwLock<Size>>,
    is_running: Arc<RwLock<bool>>,
    period: Duration,
    tx: mpsc::Sender<OverlayEvent>,
) {
    let mut frame = 0u64;
    loop {
        tokio::time::sleep(period).await;
        if !*is_running.read() {
            break;
        }

        let Some(snapshot) = source.snapshot().await else {
            debug!("No frame available yet");
            continue;
        };
        frame += 1;
        let source_size = Size::from(snapshot.dimensions());

        let model = detector.clone();
        let detections = match tokio::task::spawn_blocking(move || model.detect(&snapshot)).await {
            Ok(Ok(Some(detections))) => detections,
            Ok(Ok(None)) => {
                debug!("Detector returned nothing for frame {}", frame);
                continue;
            }
            Ok(Err(e)) => {
                warn!("Detection failed on frame {}: {}", frame, e);
                continue;
            }
            Err(e) => {
                error!("Detector task panicked on frame {}: {}", frame, e);
                continue;
            }
        };

        let event = if detections.is_empty() {
            OverlayEvent::Cleared { frame }
        } else {
            let viewport = *viewport.read();
            match projector.project(&detections, source_size, viewport) {
                Ok(items) => OverlayEvent::Updated { frame, items },
                Err(e) => {
                    warn!("Dropping overlay for frame {}: {}", frame, e);
                    continue;
                }
            }
        };

        if tx.send(event).await.is_err() {
            warn!("Overlay receiver dropped, stopping frame sampler");
            break;
        }
    }

    *is_running.write() = false;
}

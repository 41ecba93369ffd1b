//! Frame sampler tests for anafi-eye

use anafi_eye::{
    Color, Detection, Detector, EyeConfig, FixedAdvanceMeasure, FrameSampler, FrameSource, OverlayEvent, Rect,
    Size, VisionError,
};
use async_trait::async_trait;
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::time::{timeout, Duration};

struct StillFrames {
    size: (u32, u32),
    available: bool,
}

#[async_trait]
impl FrameSource for StillFrames {
    async fn snapshot(&self) -> Option<RgbaImage> {
        self.available.then(|| RgbaImage::new(self.size.0, self.size.1))
    }
}

/// Replays scripted results, then keeps returning an empty frame.
struct ScriptedDetector {
    script: Mutex<VecDeque<Result<Option<Vec<Detection>>, VisionError>>>,
}

impl ScriptedDetector {
    fn new(script: Vec<Result<Option<Vec<Detection>>, VisionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&self, _frame: &RgbaImage) -> Result<Option<Vec<Detection>>, VisionError> {
        self.script.lock().pop_front().unwrap_or(Ok(Some(vec![])))
    }
}

fn fast_config() -> EyeConfig {
    EyeConfig {
        sample_rate_hz: 50.0,
        ..EyeConfig::default()
    }
}

fn drone_detection() -> Detection {
    Detection::new(Rect::new(0.0, 100.0, 50.0, 50.0), "drone", 0.91, Color::rgb(0, 0, 255))
}

fn start(
    source: StillFrames,
    detector: ScriptedDetector,
    viewport: Size,
) -> (FrameSampler, tokio::sync::mpsc::Receiver<OverlayEvent>) {
    let config = fast_config();
    let projector = config.projector(Arc::new(FixedAdvanceMeasure::default()));
    FrameSampler::start(Arc::new(source), Arc::new(detector), projector, viewport, &config)
}

async fn next_event(rx: &mut tokio::sync::mpsc::Receiver<OverlayEvent>) -> OverlayEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for overlay event")
        .expect("sampler stopped")
}

#[tokio::test]
async fn test_sampler_projects_with_snapshot_size() {
    let (sampler, mut rx) = start(
        StillFrames { size: (640, 480), available: true },
        ScriptedDetector::new(vec![Ok(Some(vec![drone_detection()]))]),
        Size::new(1280.0, 480.0),
    );

    match next_event(&mut rx).await {
        OverlayEvent::Updated { frame, items } => {
            assert_eq!(frame, 1);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].border_rect, Rect::new(0.0, 100.0, 100.0, 50.0));
            assert_eq!(items[0].label, "drone  (91%)");
        }
        other => panic!("Expected update, got {:?}", other),
    }

    // Script exhausted: the model keeps finding nothing.
    let cleared = next_event(&mut rx).await;
    assert_eq!(cleared, OverlayEvent::Cleared { frame: 2 });
    assert!(cleared.items().is_empty());

    sampler.stop();
}

#[tokio::test]
async fn test_sampler_skips_missing_and_failed_frames() {
    let (sampler, mut rx) = start(
        StillFrames { size: (100, 100), available: true },
        ScriptedDetector::new(vec![
            Ok(None),
            Err(VisionError::Inference("model busy".to_string())),
            Ok(Some(vec![drone_detection()])),
        ]),
        Size::new(100.0, 100.0),
    );

    let event = next_event(&mut rx).await;
    assert_eq!(event.frame(), 3);
    assert_eq!(event.items().len(), 1);

    sampler.stop();
}

#[tokio::test]
async fn test_sampler_waits_for_frames() {
    let (sampler, mut rx) = start(
        StillFrames { size: (100, 100), available: false },
        ScriptedDetector::new(vec![]),
        Size::new(100.0, 100.0),
    );

    let result = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(result.is_err(), "no event expected without frames");
    assert!(sampler.is_running());
    sampler.stop();
}

#[tokio::test]
async fn test_sampler_viewport_update() {
    let (sampler, mut rx) = start(
        StillFrames { size: (640, 480), available: true },
        ScriptedDetector::new(vec![Ok(Some(vec![drone_detection()])), Ok(Some(vec![drone_detection()]))]),
        Size::new(640.0, 480.0),
    );

    let first = next_event(&mut rx).await;
    assert_eq!(first.items()[0].border_rect, Rect::new(0.0, 100.0, 50.0, 50.0));

    sampler.set_viewport(Size::new(1280.0, 960.0));
    assert_eq!(sampler.viewport(), Size::new(1280.0, 960.0));

    let second = next_event(&mut rx).await;
    // The viewport may change while the second frame is in flight.
    let rect = second.items()[0].border_rect;
    assert!(rect == Rect::new(0.0, 200.0, 100.0, 100.0) || rect == Rect::new(0.0, 100.0, 50.0, 50.0));

    sampler.stop();
}

#[tokio::test]
async fn test_sampler_stop_closes_channel() {
    let (sampler, mut rx) = start(
        StillFrames { size: (100, 100), available: true },
        ScriptedDetector::new(vec![]),
        Size::new(100.0, 100.0),
    );

    sampler.stop();
    assert!(!sampler.is_running());

    // Drain whatever was already queued, then the channel must close.
    let closed = timeout(Duration::from_secs(2), async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}

#[tokio::test]
async fn test_sampler_rejects_invalid_viewport() {
    let (sampler, mut rx) = start(
        StillFrames { size: (100, 100), available: true },
        ScriptedDetector::new(vec![Ok(Some(vec![drone_detection()])), Ok(Some(vec![]))]),
        Size::new(0.0, 100.0),
    );

    // The first frame cannot be projected and is dropped; the empty second frame still clears.
    let event = next_event(&mut rx).await;
    assert_eq!(event, OverlayEvent::Cleared { frame: 2 });

    sampler.stop();
}

#[tokio::test]
async fn test_sampler_stops_when_receiver_dropped() {
    let (sampler, rx) = start(
        StillFrames { size: (100, 100), available: true },
        ScriptedDetector::new(vec![]),
        Size::new(100.0, 100.0),
    );
    drop(rx);

    let stopped = timeout(Duration::from_secs(2), async {
        while sampler.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(stopped.is_ok());
}

#[tokio::test]
async fn test_sampler_starts_with_out_of_range_rate() {
    let config = EyeConfig {
        sample_rate_hz: 1e-30,
        ..EyeConfig::default()
    };
    let projector = config.projector(Arc::new(FixedAdvanceMeasure::default()));
    let (sampler, _rx) = FrameSampler::start(
        Arc::new(StillFrames { size: (100, 100), available: true }),
        Arc::new(ScriptedDetector::new(vec![])),
        projector,
        Size::new(100.0, 100.0),
        &config,
    );

    assert!(sampler.is_running());
    sampler.stop();
    assert!(!sampler.is_running());
}

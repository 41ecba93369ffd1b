//! anafi-eye: detection overlay for the Anafi live feed
//!
//! Projects detections produced by an on-device model from the model's image
//! space onto the live video viewport, measures their labels, and paints the
//! resulting overlay. A sampling loop ties a frame source and a detector to
//! the projector once per period.

pub mod config;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod projector;
pub mod render;
pub mod sampler;
pub mod text;

pub use config::EyeConfig;
pub use detection::{format_label, Color, Detection, OverlayItem};
pub use error::VisionError;
pub use geometry::{Rect, Size};
pub use projector::{project, OverlayProjector};
pub use render::OverlayRenderer;
pub use sampler::{Detector, FrameSampler, FrameSource, OverlayEvent};
pub use text::{CachedMeasure, FixedAdvanceMeasure, FontSpec, FontWeight, GlyphMeasure, TextMeasure};

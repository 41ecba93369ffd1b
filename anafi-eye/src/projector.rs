//! Detection overlay projection
//!
//! Maps detection rectangles from the model's image space onto the viewport
//! that shows the live feed, keeps them inside the viewport with a fixed
//! margin, and attaches a measured label to each.

use crate::detection::{format_label, Detection, OverlayItem};
use crate::error::VisionError;
use crate::geometry::{Rect, Size};
use crate::text::{FontSpec, TextMeasure};
use std::sync::Arc;
use tracing::debug;

/// Project detections into viewport space.
///
/// Items come out one per detection, in input order. Rectangles are scaled
/// independently along x and y, then clamped:
///
/// * a negative origin coordinate is reset to `edge_offset`;
/// * a bottom (then right) edge past the viewport is pulled back so it sits
///   `edge_offset` pixels inside, using the already clamped origin.
///
/// Nothing is dropped, even when clamping leaves no area. The source size is
/// not checked: a zero dimension makes the scale infinite and the geometry
/// non-finite. Use [`OverlayProjector::project`] to reject such input.
pub fn project(
    detections: &[Detection],
    source_size: Size,
    viewport_size: Size,
    font: &FontSpec,
    edge_offset: f64,
    measure: &dyn TextMeasure,
) -> Vec<OverlayItem> {
    let sx = viewport_size.width / source_size.width;
    let sy = viewport_size.height / source_size.height;

    detections
        .iter()
        .map(|detection| {
            let border_rect = clamp_to_viewport(detection.rect.scaled(sx, sy), viewport_size, edge_offset);
            let label = format_label(&detection.class_name, detection.confidence);
            let label_size = measure.measure(&label, font);
            OverlayItem {
                label,
                border_rect,
                label_size,
                color: detection.display_color,
            }
        })
        .collect()
}

fn clamp_to_viewport(mut rect: Rect, viewport: Size, edge_offset: f64) -> Rect {
    if rect.x < 0.0 {
        rect.x = edge_offset;
    }
    if rect.y < 0.0 {
        rect.y = edge_offset;
    }
    if rect.max_y() > viewport.height {
        rect.height = viewport.height - rect.y - edge_offset;
    }
    if rect.max_x() > viewport.width {
        rect.width = viewport.width - rect.x - edge_offset;
    }
    rect
}

/// Projector bound to a label font, a margin and a measurer, validating its
/// geometry before projecting.
#[derive(Clone)]
pub struct OverlayProjector {
    font: FontSpec,
    edge_offset: f64,
    measure: Arc<dyn TextMeasure>,
}

impl OverlayProjector {
    pub fn new(font: FontSpec, edge_offset: f64, measure: Arc<dyn TextMeasure>) -> Self {
        Self {
            font,
            edge_offset,
            measure,
        }
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn edge_offset(&self) -> f64 {
        self.edge_offset
    }

    /// Project after checking that both sizes are finite and positive and
    /// that the margin is finite and non-negative.
    pub fn project(
        &self,
        detections: &[Detection],
        source_size: Size,
        viewport_size: Size,
    ) -> Result<Vec<OverlayItem>, VisionError> {
        if !source_size.is_positive() {
            return Err(VisionError::InvalidInput(format!(
                "source image size must be positive, got {}x{}",
                source_size.width, source_size.height
            )));
        }
        if !viewport_size.is_positive() {
            return Err(VisionError::InvalidInput(format!(
                "viewport size must be positive, got {}x{}",
                viewport_size.width, viewport_size.height
            )));
        }
        if !self.edge_offset.is_finite() || self.edge_offset < 0.0 {
            return Err(VisionError::InvalidInput(format!(
                "edge offset must be non-negative, got {}",
                self.edge_offset
            )));
        }

        let items = project(
            detections,
            source_size,
            viewport_size,
            &self.font,
            self.edge_offset,
            self.measure.as_ref(),
        );
        debug!(
            "Projected {} detections from {}x{} onto {}x{}",
            items.len(),
            source_size.width,
            source_size.height,
            viewport_size.width,
            viewport_size.height
        );
        Ok(items)
    }
}

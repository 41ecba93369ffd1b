//! Detections coming out of the model and the overlay items made from them

use crate::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};

/// RGBA display color chosen by the detector, usually one per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// One model output, expressed in the pixel space of the image fed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: Rect,
    pub class_name: String,
    pub confidence: f32,
    pub display_color: Color,
}

impl Detection {
    pub fn new(rect: Rect, class_name: impl Into<String>, confidence: f32, display_color: Color) -> Self {
        Self {
            rect,
            class_name: class_name.into(),
            confidence,
            display_color,
        }
    }
}

/// A detection projected into viewport space, ready to paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayItem {
    pub label: String,
    pub border_rect: Rect,
    pub label_size: Size,
    pub color: Color,
}

impl OverlayItem {
    /// Clamping can leave a rectangle with no area (or non-finite geometry
    /// when the source size was degenerate). Such items are still emitted;
    /// renderers are expected to skip them.
    pub fn is_drawable(&self) -> bool {
        self.border_rect.has_area()
    }
}

/// Label shown next to a box: class name, two spaces, truncated percentage.
pub fn format_label(class_name: &str, confidence: f32) -> String {
    let percent = (confidence * 100.0).floor() as i64;
    format!("{}  ({}%)", class_name, percent)
}

//! Paints overlay items onto an RGBA frame

use crate::detection::{Color, OverlayItem};
use crate::geometry::Rect;
use crate::text::FontSpec;
use ab_glyph::{FontArc, PxScale};
use image::RgbaImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect as PixelRect;
use tracing::debug;

/// Draws a border per item plus a label plate in its top-left corner.
/// Label text is only drawn when a glyph font is available.
pub struct OverlayRenderer {
    font: Option<FontArc>,
    font_spec: FontSpec,
    border_width: u32,
    text_color: Color,
}

impl OverlayRenderer {
    pub fn new(font: Option<FontArc>, font_spec: FontSpec) -> Self {
        Self {
            font,
            font_spec,
            border_width: 2,
            text_color: Color::WHITE,
        }
    }

    pub fn with_border_width(mut self, border_width: u32) -> Self {
        self.border_width = border_width.max(1);
        self
    }

    /// Paint every drawable item and return how many were painted.
    pub fn paint(&self, frame: &mut RgbaImage, items: &[OverlayItem]) -> usize {
        let mut painted = 0;
        for item in items {
            if !item.is_drawable() {
                debug!("Skipping degenerate overlay {:?}", item.label);
                continue;
            }
            let Some(border) = to_pixel_rect(&item.border_rect) else {
                continue;
            };

            let color = item.color.to_rgba();
            for inset in 0..self.border_width as i32 {
                let width = border.width() as i32 - 2 * inset;
                let height = border.height() as i32 - 2 * inset;
                if width <= 0 || height <= 0 {
                    break;
                }
                let ring = PixelRect::at(border.left() + inset, border.top() + inset)
                    .of_size(width as u32, height as u32);
                draw_hollow_rect_mut(frame, ring, color);
            }

            let plate = Rect::new(
                item.border_rect.x,
                item.border_rect.y,
                item.label_size.width,
                item.label_size.height,
            );
            if let Some(plate) = to_pixel_rect(&plate) {
                draw_filled_rect_mut(frame, plate, color);
                if let Some(font) = &self.font {
                    draw_text_mut(
                        frame,
                        self.text_color.to_rgba(),
                        plate.left(),
                        plate.top(),
                        PxScale::from(self.font_spec.size),
                        font,
                        &item.label,
                    );
                }
            }
            painted += 1;
        }
        painted
    }
}

fn to_pixel_rect(rect: &Rect) -> Option<PixelRect> {
    if !rect.has_area() {
        return None;
    }
    let x = rect.x.round();
    let y = rect.y.round();
    if x.abs() > i32::MAX as f64 || y.abs() > i32::MAX as f64 {
        return None;
    }
    let width = rect.width.round().clamp(1.0, u32::MAX as f64) as u32;
    let height = rect.height.round().clamp(1.0, u32::MAX as f64) as u32;
    Some(PixelRect::at(x as i32, y as i32).of_size(width, height))
}

//! Label text measurement

use crate::error::VisionError;
use crate::geometry::Size;
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::{debug, info};

/// Font weight requested for label text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    Regular,
    Medium,
    Bold,
}

/// Font used to render overlay labels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FontSpec {
    /// Pixel size
    pub size: f32,
    pub weight: FontWeight,
}

impl FontSpec {
    pub const fn new(size: f32, weight: FontWeight) -> Self {
        Self { size, weight }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(6.0, FontWeight::Medium)
    }
}

impl PartialEq for FontSpec {
    fn eq(&self, other: &Self) -> bool {
        self.size.to_bits() == other.size.to_bits() && self.weight == other.weight
    }
}

impl Eq for FontSpec {}

impl Hash for FontSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.size.to_bits().hash(state);
        self.weight.hash(state);
    }
}

/// Measures the rendered size of a string. Implementations must be pure:
/// the same text and font always yield the same size.
#[cfg_attr(test, mockall::automock)]
pub trait TextMeasure: Send + Sync {
    fn measure(&self, text: &str, font: &FontSpec) -> Size;
}

/// Measurement backed by a loaded TrueType/OpenType font.
///
/// The font file decides the weight; `FontSpec::weight` is not applied.
#[derive(Clone)]
pub struct GlyphMeasure {
    font: FontArc,
}

impl GlyphMeasure {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, VisionError> {
        let font = FontArc::try_from_vec(data)?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self, VisionError> {
        let data = std::fs::read(path)?;
        let measure = Self::from_bytes(data)?;
        info!("Loaded label font from {:?}", path);
        Ok(measure)
    }

    /// Font handle, shared with the renderer.
    pub fn font(&self) -> FontArc {
        self.font.clone()
    }
}

impl TextMeasure for GlyphMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> Size {
        let scaled = self.font.as_scaled(PxScale::from(font.size));
        let mut width = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        let height = scaled.ascent() - scaled.descent() + scaled.line_gap();
        Size::new(width as f64, height as f64)
    }
}

/// Deterministic measurement used when no font file is configured:
/// every character advances by `size * advance_ratio`.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceMeasure {
    pub advance_ratio: f64,
    pub line_ratio: f64,
}

impl Default for FixedAdvanceMeasure {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            line_ratio: 1.2,
        }
    }
}

impl TextMeasure for FixedAdvanceMeasure {
    fn measure(&self, text: &str, font: &FontSpec) -> Size {
        let size = font.size as f64;
        let chars = text.chars().count() as f64;
        Size::new(chars * size * self.advance_ratio, size * self.line_ratio)
    }
}

/// LRU cache in front of another measurer, keyed by text and font.
pub struct CachedMeasure<M> {
    inner: M,
    cache: Mutex<LruCache<(String, FontSpec), Size>>,
}

impl<M: TextMeasure> CachedMeasure<M> {
    pub fn new(inner: M, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl<M: TextMeasure> TextMeasure for CachedMeasure<M> {
    fn measure(&self, text: &str, font: &FontSpec) -> Size {
        let key = (text.to_string(), *font);
        if let Some(size) = self.cache.lock().get(&key) {
            return *size;
        }

        // Measure outside the lock; a concurrent miss on the same key just
        // stores the same value twice.
        let size = self.inner.measure(text, font);
        debug!("Measured label {:?}: {}x{}", text, size.width, size.height);
        self.cache.lock().put(key, size);
        size
    }
}

//! Configuration for anafi-eye

use crate::error::VisionError;
use crate::projector::OverlayProjector;
use crate::text::{CachedMeasure, FixedAdvanceMeasure, FontSpec, GlyphMeasure, TextMeasure};
use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Overlay and sampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// Frames sampled per second for detection
    pub sample_rate_hz: f64,
    /// Margin in viewport pixels used when clamping boxes
    pub edge_offset: f64,
    /// Font used to measure and draw labels
    pub label_font: FontSpec,
    /// TrueType/OpenType font file; a fixed-advance measurer is used without one
    pub font_path: Option<PathBuf>,
    /// Capacity of the overlay event channel
    pub event_buffer: usize,
    /// Number of measured labels kept in the LRU cache
    pub measure_cache_size: usize,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1.0,
            edge_offset: 2.0,
            label_font: FontSpec::default(),
            font_path: None,
            event_buffer: 16,
            measure_cache_size: 256,
        }
    }
}

impl EyeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 || self.sample_rate_hz > 60.0 {
            return Err("Sample rate must be within (0, 60] Hz".to_string());
        }

        if !self.edge_offset.is_finite() || self.edge_offset < 0.0 {
            return Err("Edge offset must be a non-negative number".to_string());
        }

        let size = self.label_font.size;
        if !size.is_finite() || size <= 0.0 || size > 200.0 {
            return Err("Label font size must be within (0, 200]".to_string());
        }

        if self.event_buffer == 0 || self.event_buffer > 1024 {
            return Err("Event buffer must be between 1 and 1024".to_string());
        }

        if self.measure_cache_size == 0 {
            return Err("Measure cache size must be non-zero".to_string());
        }

        Ok(())
    }

    /// Delay between two sampled frames. Rates whose period cannot be
    /// represented fall back to one frame per second.
    pub fn sample_period(&self) -> Duration {
        let default = Duration::from_secs(1);
        if self.sample_rate_hz.is_nan() || self.sample_rate_hz <= 0.0 {
            return default;
        }
        Duration::try_from_secs_f64(1.0 / self.sample_rate_hz).unwrap_or_else(|_| {
            warn!("Sample rate {} Hz out of range, sampling once per second", self.sample_rate_hz);
            default
        })
    }

    /// Load configuration from a JSON, TOML or YAML file
    pub fn from_file(path: &Path) -> Result<Self, VisionError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = content.parse()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Defaults overridden by `ANAFI_*` environment variables
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `ANAFI_*` keys
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(rate) = lookup("ANAFI_SAMPLE_RATE_HZ").and_then(|v| v.parse::<f64>().ok()) {
            config.sample_rate_hz = rate;
        }

        if let Some(offset) = lookup("ANAFI_EDGE_OFFSET").and_then(|v| v.parse::<f64>().ok()) {
            config.edge_offset = offset;
        }

        if let Some(size) = lookup("ANAFI_FONT_SIZE").and_then(|v| v.parse::<f32>().ok()) {
            config.label_font.size = size;
        }

        if let Some(path) = lookup("ANAFI_FONT_PATH") {
            if !path.is_empty() {
                config.font_path = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Build the label measurer, plus the glyph font when one is configured.
    pub fn build_measure(&self) -> Result<(Arc<dyn TextMeasure>, Option<FontArc>), VisionError> {
        match &self.font_path {
            Some(path) => {
                let glyphs = GlyphMeasure::from_file(path)?;
                let font = glyphs.font();
                Ok((Arc::new(CachedMeasure::new(glyphs, self.measure_cache_size)), Some(font)))
            }
            None => {
                warn!("No label font configured, falling back to fixed-advance measurement");
                let measure = CachedMeasure::new(FixedAdvanceMeasure::default(), self.measure_cache_size);
                Ok((Arc::new(measure), None))
            }
        }
    }

    pub fn projector(&self, measure: Arc<dyn TextMeasure>) -> OverlayProjector {
        OverlayProjector::new(self.label_font, self.edge_offset, measure)
    }
}

impl FromStr for EyeConfig {
    type Err = VisionError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        if let Ok(config) = serde_json::from_str::<EyeConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = toml::from_str::<EyeConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = serde_yaml::from_str::<EyeConfig>(content) {
            return Ok(config);
        }

        Err(VisionError::Config("Unknown configuration format".to_string()))
    }
}

//! Error types for anafi-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<ab_glyph::InvalidFont> for VisionError {
    fn from(err: ab_glyph::InvalidFont) -> Self {
        VisionError::Font(err.to_string())
    }
}

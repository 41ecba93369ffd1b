//! Error types for anafi-pilot

use anafi_eye::VisionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Drone not found: {0}")]
    DroneNotFound(String),

    #[error("No drone listed at row {0}")]
    NoSuchRow(usize),

    #[error("Connection rejected by drone {0}")]
    ConnectionRejected(String),

    #[error("Manual piloting unavailable on drone {0}")]
    PilotingUnavailable(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

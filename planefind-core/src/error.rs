//! Error types for planefind

use std::time::Duration;
use thiserror::Error;

/// Main error type for plane finder operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("no point cloud received within {timeout:?}")]
    NoFrameReceived { timeout: Duration },

    #[error("insufficient valid input points: need {required}, have {available}")]
    InsufficientInputPoints { required: usize, available: usize },

    #[error("insufficient plane fit: best plane has {inliers} inliers, need {required}")]
    InsufficientPlaneFit { inliers: usize, required: usize },

    #[error("plane orientation mismatch: cos(angle) {cos_angle:.4} below minimum {min_cos:.4}")]
    PlaneOrientationMismatch { cos_angle: f64, min_cos: f64 },

    #[error("insufficient samples: need {required}, plane has {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("transform to '{frame}' unavailable: {reason}")]
    TransformUnavailable { frame: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown feature finder: {0}")]
    UnknownFinder(String),
}

/// Result type alias for planefind operations
pub type Result<T> = std::result::Result<T, Error>;

//! # planefind algorithms
//!
//! The per-frame processing stages of the plane finder: invalid point
//! filtering, RANSAC plane extraction and deterministic observation sampling.
//! All stages are synchronous functions of their inputs.

pub mod filtering;
pub mod segmentation;
pub mod observation;

// Re-export commonly used items
pub use filtering::*;
pub use segmentation::*;
pub use observation::*;

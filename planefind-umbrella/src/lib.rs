//! # planefind
//!
//! Plane detection and observation extraction for extrinsic calibration of
//! depth sensors mounted on a robot.
//!
//! This is the umbrella crate that provides convenient access to all planefind
//! functionality. Use the individual crates for more granular control over
//! dependencies.
//!
//! ## Features
//!
//! - **Core**: point clouds with validity masks, transforms, observations
//! - **Algorithms**: point filtering, RANSAC plane extraction, observation sampling
//! - **Capture**: frame synchronizer, plane finder controller and finder registry
//!
//! ## Quick Start
//!
//! ```rust
//! use planefind::prelude::*;
//!
//! let points: Vec<Point3d> = (0..400)
//!     .map(|i| Point3d::new((i % 20) as f64 * 0.05, (i / 20) as f64 * 0.05, 1.0))
//!     .collect();
//! let mut cloud = PointCloud::organized(20, 20, points).unwrap();
//!
//! remove_invalid_points(&mut cloud, &BoundingBox::default());
//! let extraction = extract_plane(&cloud, &RansacParams::default()).unwrap();
//! let observation = build_observation(&extraction.plane, "camera", 60, None).unwrap();
//! assert_eq!(observation.points.len(), 60);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables algorithms and capture
//! - `algorithms`: Filtering, plane extraction and sampling
//! - `capture`: Runtime finder (implies `algorithms`)
//! - `all`: Enables all features

// Re-export core functionality
pub use planefind_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use planefind_algorithms as algorithms;

#[cfg(feature = "capture")]
pub use planefind_capture as capture;

/// Convenient imports for common use cases
pub mod prelude {
    pub use planefind_core::*;

    #[cfg(feature = "algorithms")]
    pub use planefind_algorithms::*;

    #[cfg(feature = "capture")]
    pub use planefind_capture::*;
}

//! Core data structures and traits for planefind
//!
//! This crate provides the fundamental types shared by the plane finder:
//! points, point clouds with validity masks, rigid transforms, camera
//! intrinsics, calibration observations and the collaborator traits.

pub mod point;
pub mod point_cloud;
pub mod camera;
pub mod observation;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use camera::*;
pub use observation::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Isometry3, UnitQuaternion, Unit};

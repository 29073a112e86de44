//! Traits for the collaborators of the plane finder

use crate::{error::Result, point::Point3d, transform::RigidTransform};
use std::time::SystemTime;

/// Resolves named coordinate frames at a point in time
pub trait TransformLookup: Send + Sync {
    /// Look up the transform of `target_frame` at `stamp`
    ///
    /// Implementations return [`crate::Error::TransformUnavailable`] when the
    /// transform is unknown or not available for that time.
    fn lookup_transform(&self, target_frame: &str, stamp: SystemTime) -> Result<RigidTransform>;
}

/// Best-effort sink for debug point clouds
///
/// Publishing must never fail the caller; implementations swallow their own errors.
pub trait DebugSink: Send + Sync {
    /// Publish a set of points observed by `sensor_name`
    fn publish(&self, sensor_name: &str, frame_id: &str, points: &[Point3d]);
}

//! Filtering algorithms

use planefind_core::{is_finite_point, Point3d, PointCloud};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned box, in sensor-frame meters, outside of which points are rejected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_x: -2.0,
            max_x: 2.0,
            min_y: -2.0,
            max_y: 2.0,
            min_z: 0.0,
            max_z: 2.0,
        }
    }
}

impl BoundingBox {
    /// A box that accepts every finite point
    pub fn unbounded() -> Self {
        Self {
            min_x: f64::NEG_INFINITY,
            max_x: f64::INFINITY,
            min_y: f64::NEG_INFINITY,
            max_y: f64::INFINITY,
            min_z: f64::NEG_INFINITY,
            max_z: f64::INFINITY,
        }
    }

    /// Whether `point` lies inside the box, bounds included
    pub fn contains(&self, point: &Point3d) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
            && point.z >= self.min_z
            && point.z <= self.max_z
    }
}

/// Check a single point against the validity rules
///
/// A point is invalid if any coordinate is NaN or infinite, if its depth is
/// exactly zero (no range return), or if it lies outside `bounds`.
#[inline]
pub fn is_point_valid(point: &Point3d, bounds: &BoundingBox) -> bool {
    is_finite_point(point) && point.z != 0.0 && bounds.contains(point)
}

/// Invalid point removal
///
/// Marks every invalid point of the cloud in its validity mask. Points are not
/// erased, so organized clouds keep their pixel indexing. Applying the filter
/// twice with the same bounds changes nothing the second time.
///
/// # Arguments
/// * `cloud` - Point cloud to filter in place
/// * `bounds` - Accepted region in the sensor frame
///
/// # Returns
/// * `usize` - Number of points newly marked invalid
///
/// # Example
/// ```rust
/// use planefind_core::{PointCloud, Point3d};
/// use planefind_algorithms::{remove_invalid_points, BoundingBox};
///
/// let mut cloud = PointCloud::from_points(vec![
///     Point3d::new(0.0, 0.0, 1.0),
///     Point3d::new(f64::NAN, 0.0, 1.0),
///     Point3d::new(0.0, 0.0, 0.0),
///     Point3d::new(5.0, 0.0, 1.0),
/// ]);
///
/// let removed = remove_invalid_points(&mut cloud, &BoundingBox::default());
/// assert_eq!(removed, 3);
/// assert_eq!(cloud.valid_count(), 1);
/// assert_eq!(cloud.len(), 4);
/// ```
pub fn remove_invalid_points(cloud: &mut PointCloud, bounds: &BoundingBox) -> usize {
    let rejected: Vec<usize> = cloud
        .points()
        .par_iter()
        .enumerate()
        .filter(|(_, point)| !is_point_valid(point, bounds))
        .map(|(idx, _)| idx)
        .collect();

    let removed = rejected
        .into_iter()
        .filter(|&idx| cloud.invalidate(idx))
        .count();

    log::debug!(
        "removed {} invalid points, {} of {} remain",
        removed,
        cloud.valid_count(),
        cloud.len()
    );
    removed
}

//! Pinhole intrinsics of the depth camera producing the clouds

use crate::point::*;
use nalgebra::Unit;
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics, attached to observations for the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub width: u32,
    pub height: u32,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Project a camera-frame point to `(u, v)` image coordinates
    ///
    /// Returns `None` for points at or behind the image plane.
    pub fn project(&self, point: &Point3d) -> Option<(f64, f64)> {
        if point.z <= 0.0 || !is_finite_point(point) {
            return None;
        }
        Some((
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        ))
    }

    /// Unit viewing ray through the center of a pixel
    pub fn pixel_ray(&self, pixel: PixelCoord) -> Unit<Vector3d> {
        let x = (pixel.col as f64 - self.cx) / self.fx;
        let y = (pixel.row as f64 - self.cy) / self.fy;
        Unit::new_normalize(Vector3d::new(x, y, 1.0))
    }

    /// Whether `(u, v)` falls inside the image
    pub fn contains(&self, u: f64, v: f64) -> bool {
        u >= 0.0 && v >= 0.0 && u < self.width as f64 && v < self.height as f64
    }
}

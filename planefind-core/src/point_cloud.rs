//! Point cloud data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Memory layout of a point cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudLayout {
    /// Points have no image structure
    Unorganized,
    /// Points are stored row-major, one per sensor pixel
    Organized { width: u32, height: u32 },
}

/// A point cloud captured by a depth sensor
///
/// Points are never removed once captured. Filtering clears entries in a
/// parallel validity mask instead, so that index `i` of an organized cloud
/// always maps to the same pixel. The points are only reachable through
/// methods that keep the mask the same length.
#[derive(Debug, Clone)]
pub struct PointCloud {
    points: Vec<Point3d>,
    valid: Vec<bool>,
    layout: CloudLayout,
    /// Capture time of the frame
    pub stamp: SystemTime,
    /// Coordinate frame the points are expressed in
    pub frame_id: String,
}

impl PointCloud {
    /// Create a new empty, unorganized point cloud
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            valid: Vec::new(),
            layout: CloudLayout::Unorganized,
            stamp: SystemTime::UNIX_EPOCH,
            frame_id: String::new(),
        }
    }

    /// Create an unorganized point cloud from a vector of points
    pub fn from_points(points: Vec<Point3d>) -> Self {
        let valid = vec![true; points.len()];
        Self {
            points,
            valid,
            ..Self::new()
        }
    }

    /// Create an organized point cloud from row-major points
    pub fn organized(width: u32, height: u32, points: Vec<Point3d>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if points.len() != expected {
            return Err(Error::InvalidData(format!(
                "organized cloud {}x{} needs {} points, got {}",
                width,
                height,
                expected,
                points.len()
            )));
        }
        let mut cloud = Self::from_points(points);
        cloud.layout = CloudLayout::Organized { width, height };
        Ok(cloud)
    }

    /// Set the capture time
    pub fn with_stamp(mut self, stamp: SystemTime) -> Self {
        self.stamp = stamp;
        self
    }

    /// Set the coordinate frame
    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    /// Get the number of points in the cloud, valid or not
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points, valid or not, in capture order
    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&Point3d> {
        self.points.get(index)
    }

    pub fn layout(&self) -> CloudLayout {
        self.layout
    }

    pub fn is_organized(&self) -> bool {
        matches!(self.layout, CloudLayout::Organized { .. })
    }

    /// Add a valid point to the cloud
    ///
    /// Pushing onto an organized cloud drops its organization.
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point);
        self.valid.push(true);
        self.layout = CloudLayout::Unorganized;
    }

    /// Whether the point at `index` is still valid
    pub fn is_valid(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    /// Mark the point at `index` invalid, returning whether it was valid before
    pub fn invalidate(&mut self, index: usize) -> bool {
        match self.valid.get_mut(index) {
            Some(flag) => std::mem::replace(flag, false),
            None => false,
        }
    }

    /// The validity mask, parallel to `points`
    pub fn validity(&self) -> &[bool] {
        &self.valid
    }

    /// Number of valid points
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Indices of all valid points, in cloud order
    pub fn valid_indices(&self) -> Vec<usize> {
        self.valid
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| i)
            .collect()
    }

    /// Pixel of the point at `index` when the cloud is organized
    pub fn pixel(&self, index: usize) -> Option<PixelCoord> {
        match self.layout {
            CloudLayout::Organized { width, height } if width > 0 => {
                let row = index / width as usize;
                if row >= height as usize {
                    return None;
                }
                Some(PixelCoord::new(row as u32, (index % width as usize) as u32))
            }
            _ => None,
        }
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Point3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self::from_points(Vec::from_iter(iter))
    }
}

/// The inlier points of a fitted plane
///
/// Each entry keeps its index into the source cloud and, for organized
/// sources, its pixel. The three sequences always have the same length.
#[derive(Debug, Clone)]
pub struct PlaneCloud {
    indices: Vec<usize>,
    points: Vec<Point3d>,
    pixels: Vec<Option<PixelCoord>>,
    stamp: SystemTime,
    frame_id: String,
}

impl PlaneCloud {
    /// Gather the given source indices out of `cloud`, in the given order
    ///
    /// Fails with [`Error::InvalidData`] if an index is outside the cloud.
    pub fn from_indices(cloud: &PointCloud, indices: Vec<usize>) -> Result<Self> {
        let points = indices
            .iter()
            .map(|&i| {
                cloud.point(i).copied().ok_or_else(|| {
                    Error::InvalidData(format!("index {} outside cloud of {} points", i, cloud.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let pixels = indices.iter().map(|&i| cloud.pixel(i)).collect();
        Ok(Self {
            indices,
            points,
            pixels,
            stamp: cloud.stamp,
            frame_id: cloud.frame_id.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Source cloud index of every inlier
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    pub fn pixels(&self) -> &[Option<PixelCoord>] {
        &self.pixels
    }

    /// Position and pixel of the `i`-th inlier
    pub fn get(&self, i: usize) -> Option<(Point3d, Option<PixelCoord>)> {
        Some((*self.points.get(i)?, *self.pixels.get(i)?))
    }

    pub fn stamp(&self) -> SystemTime {
        self.stamp
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }
}

//! Calibration observations handed to the optimizer

use crate::camera::CameraIntrinsics;
use crate::point::*;
use crate::transform::StampedTransform;
use nalgebra::Unit;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A single observed 3D sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    /// Source pixel, when the cloud was organized
    pub pixel: Option<PixelCoord>,
    /// Position in the sensor frame
    pub position: Point3d,
}

impl ObservedPoint {
    /// Unit ray from the sensor origin through this point
    pub fn ray(&self) -> Option<Unit<Vector3d>> {
        Unit::try_new(self.position.coords, 1e-12)
    }
}

/// One sensor's set of sample points for a calibration pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationObservation {
    pub sensor_name: String,
    /// Frame the positions are expressed in
    pub frame_id: String,
    pub points: Vec<ObservedPoint>,
    #[serde(default)]
    pub camera_info: Option<CameraIntrinsics>,
    /// Full plane cloud, stored only for debugging
    #[serde(default)]
    pub cloud: Option<Vec<Point3d>>,
}

impl CalibrationObservation {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything captured for one calibration pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFrame {
    pub observations: Vec<CalibrationObservation>,
    pub reference_transform: Option<StampedTransform>,
    pub stamp: SystemTime,
    /// Sequence number of the sensor frame this was built from
    pub source_sequence: u64,
}

impl CalibrationFrame {
    /// Find the observation for a sensor
    pub fn observation(&self, sensor_name: &str) -> Option<&CalibrationObservation> {
        self.observations.iter().find(|o| o.sensor_name == sensor_name)
    }
}

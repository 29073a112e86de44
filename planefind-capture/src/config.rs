//! Finder configuration, loadable from JSON

use planefind_algorithms::{BoundingBox, RansacParams};
use planefind_core::{CameraIntrinsics, Error, Vector3d};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] Error),
}

/// Configuration of a [`crate::PlaneFinder`]
///
/// Every field has a default, so a JSON file only needs the values it changes.
/// The bounding box keys (`min_x` .. `max_z`) sit at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneFinderConfig {
    /// Name stored in the emitted observation
    pub sensor_name: String,
    /// Exact number of points in the observation
    pub points_max: usize,
    /// Spread of the RANSAC sample around its first point, 0 to disable
    pub initial_sampling_distance: f64,
    /// Maximum point-to-plane distance of an inlier
    pub plane_tolerance: f64,
    #[serde(flatten)]
    pub bounds: BoundingBox,
    /// Expected plane normal in the sensor frame; no orientation check when unset
    pub desired_normal: Option<[f64; 3]>,
    /// Minimum cosine between the found normal and `desired_normal`
    pub cos_normal_angle: f64,
    /// Frame whose transform is stamped on the calibration frame
    pub transform_frame: String,
    pub ransac_iterations: usize,
    /// Minimum inlier count of an acceptable plane
    pub ransac_points: usize,
    pub ransac_sample_size: usize,
    /// Publish the selected points and keep the plane cloud in the observation
    pub output_debug: bool,
    /// How long `find` waits for a fresh frame
    pub frame_timeout_ms: u64,
    pub seed: u64,
    pub camera_info: Option<CameraIntrinsics>,
}

impl Default for PlaneFinderConfig {
    fn default() -> Self {
        let ransac = RansacParams::default();
        Self {
            sensor_name: "camera".to_string(),
            points_max: 60,
            initial_sampling_distance: ransac.initial_sampling_distance,
            plane_tolerance: ransac.tolerance,
            bounds: BoundingBox::default(),
            desired_normal: None,
            cos_normal_angle: 0.0,
            transform_frame: "base_link".to_string(),
            ransac_iterations: ransac.iterations,
            ransac_points: ransac.min_inliers,
            ransac_sample_size: ransac.sample_size,
            output_debug: false,
            frame_timeout_ms: 10_000,
            seed: ransac.seed,
            camera_info: None,
        }
    }
}

impl PlaneFinderConfig {
    /// Parse a JSON document and validate it
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the finder cannot work with
    pub fn validate(&self) -> planefind_core::Result<()> {
        if self.points_max == 0 {
            return Err(Error::InvalidConfig("points_max must be positive".to_string()));
        }
        if !(self.plane_tolerance > 0.0) || !self.plane_tolerance.is_finite() {
            return Err(Error::InvalidConfig("plane_tolerance must be positive".to_string()));
        }
        if self.initial_sampling_distance.is_nan() {
            return Err(Error::InvalidConfig("initial_sampling_distance is NaN".to_string()));
        }
        let b = &self.bounds;
        for (axis, min, max) in [("x", b.min_x, b.max_x), ("y", b.min_y, b.max_y), ("z", b.min_z, b.max_z)] {
            if !(min <= max) {
                return Err(Error::InvalidConfig(format!(
                    "min_{} ({}) must not exceed max_{} ({})",
                    axis, min, axis, max
                )));
            }
        }
        if let Some(normal) = self.desired_normal {
            let norm = Vector3d::from(normal).norm();
            if !norm.is_finite() || norm < 1e-9 {
                return Err(Error::InvalidConfig("desired_normal must be a non-zero vector".to_string()));
            }
        }
        if !(-1.0..=1.0).contains(&self.cos_normal_angle) {
            return Err(Error::InvalidConfig("cos_normal_angle must lie in [-1, 1]".to_string()));
        }
        if self.transform_frame.is_empty() {
            return Err(Error::InvalidConfig("transform_frame must not be empty".to_string()));
        }
        self.ransac_params().validate()
    }

    /// RANSAC parameters derived from this config
    pub fn ransac_params(&self) -> RansacParams {
        RansacParams {
            iterations: self.ransac_iterations,
            sample_size: self.ransac_sample_size,
            tolerance: self.plane_tolerance,
            min_inliers: self.ransac_points,
            initial_sampling_distance: self.initial_sampling_distance,
            seed: self.seed,
        }
    }

    /// Unit vector of the desired normal, if configured
    pub fn desired_normal(&self) -> Option<Vector3d> {
        self.desired_normal
            .map(Vector3d::from)
            .and_then(|n| n.try_normalize(1e-9))
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

/// One finder entry of a capture configuration, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinderConfig {
    Plane(PlaneFinderConfig),
}

impl FinderConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            FinderConfig::Plane(_) => "plane",
        }
    }
}

/// All finders of a capture setup, keyed by finder name
pub type FindersConfig = BTreeMap<String, FinderConfig>;

/// Load a `{ "<name>": { "type": "plane", ... } }` map from disk
pub fn load_finders_json(path: impl AsRef<Path>) -> Result<FindersConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

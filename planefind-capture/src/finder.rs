//! The plane feature finder

use crate::config::PlaneFinderConfig;
use crate::sync::{CapturedFrame, FrameSynchronizer};
use planefind_algorithms::{build_observation, extract_plane, remove_invalid_points, PlaneModel};
use planefind_core::{
    CalibrationFrame, DebugSink, Error, Point3d, Result, StampedTransform, TransformLookup, Vector3d,
};
use std::sync::Arc;

/// A source of calibration observations
///
/// Every finder produces frames in the same observation format, so the
/// optimizer can consume them without knowing which finder made them.
pub trait FeatureFinder: Send {
    /// Name the finder was registered under
    fn name(&self) -> &str;

    /// Capture the next frame and extract this finder's observations
    fn find(&mut self) -> Result<CalibrationFrame>;
}

/// Debug sink that writes a summary of each published cloud to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DebugSink for LogSink {
    fn publish(&self, sensor_name: &str, frame_id: &str, points: &[Point3d]) {
        log::debug!(
            "debug cloud for '{}' in '{}': {} points",
            sensor_name,
            frame_id,
            points.len()
        );
    }
}

/// Finds the dominant plane in a depth sensor's cloud
///
/// Each [`PlaneFinder::find`] waits for a new frame, removes invalid points,
/// fits a plane with RANSAC, checks its orientation, samples a fixed number
/// of its points and stamps the result with the configured reference frame.
pub struct PlaneFinder {
    name: String,
    config: PlaneFinderConfig,
    desired_normal: Option<Vector3d>,
    frames: Arc<FrameSynchronizer>,
    transforms: Arc<dyn TransformLookup>,
    debug_sink: Option<Arc<dyn DebugSink>>,
}

impl PlaneFinder {
    /// Create a finder, validating its configuration
    pub fn new(
        name: impl Into<String>,
        config: PlaneFinderConfig,
        transforms: Arc<dyn TransformLookup>,
    ) -> Result<Self> {
        config.validate()?;
        let desired_normal = config.desired_normal();
        Ok(Self {
            name: name.into(),
            config,
            desired_normal,
            frames: Arc::new(FrameSynchronizer::new()),
            transforms,
            debug_sink: None,
        })
    }

    /// Publish debug clouds to `sink` instead of the log
    ///
    /// Only used when `output_debug` is enabled.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    /// The mailbox the sensor callback pushes frames into
    pub fn frame_source(&self) -> Arc<FrameSynchronizer> {
        Arc::clone(&self.frames)
    }

    pub fn config(&self) -> &PlaneFinderConfig {
        &self.config
    }

    /// Orient `model` towards the desired normal and check the angle between them
    ///
    /// Without a desired normal the model is returned unchanged.
    pub fn check_orientation(&self, model: &PlaneModel) -> Result<PlaneModel> {
        let Some(desired) = self.desired_normal.as_ref() else {
            return Ok(*model);
        };

        let oriented = model.oriented_towards(desired);
        let cos_angle = oriented.cos_angle_to(desired);
        if cos_angle < self.config.cos_normal_angle {
            return Err(Error::PlaneOrientationMismatch {
                cos_angle,
                min_cos: self.config.cos_normal_angle,
            });
        }
        Ok(oriented)
    }

    /// Run the extraction stages on an already captured frame
    pub fn process_frame(&self, frame: CapturedFrame) -> Result<CalibrationFrame> {
        let CapturedFrame { sequence, mut cloud } = frame;

        remove_invalid_points(&mut cloud, &self.config.bounds);

        let extraction = extract_plane(&cloud, &self.config.ransac_params())?;
        let model = self.check_orientation(&extraction.model)?;

        let sink: Option<&dyn DebugSink> = if self.config.output_debug {
            Some(self.debug_sink.as_deref().unwrap_or(&LogSink))
        } else {
            None
        };

        let mut observation = build_observation(
            &extraction.plane,
            &self.config.sensor_name,
            self.config.points_max,
            sink,
        )?;
        observation.camera_info = self.config.camera_info;
        if self.config.output_debug {
            observation.cloud = Some(extraction.plane.points().to_vec());
        }

        let reference_transform = match self
            .transforms
            .lookup_transform(&self.config.transform_frame, cloud.stamp)
        {
            Ok(transform) => Some(StampedTransform {
                frame_id: self.config.transform_frame.clone(),
                stamp: cloud.stamp,
                transform,
            }),
            Err(e) => {
                log::warn!("{}: continuing without reference transform: {}", self.name, e);
                None
            }
        };

        log::info!(
            "{}: frame {} plane normal [{:.3}, {:.3}, {:.3}] offset {:.3}, {} inliers, {} samples",
            self.name,
            sequence,
            model.normal.x,
            model.normal.y,
            model.normal.z,
            model.offset,
            extraction.inlier_count(),
            observation.points.len()
        );

        Ok(CalibrationFrame {
            observations: vec![observation],
            reference_transform,
            stamp: cloud.stamp,
            source_sequence: sequence,
        })
    }
}

impl FeatureFinder for PlaneFinder {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&mut self) -> Result<CalibrationFrame> {
        self.frames.request_frame();
        let result = self
            .frames
            .wait_for_cloud(self.config.frame_timeout())
            .and_then(|frame| self.process_frame(frame));

        if let Err(e) = &result {
            log::warn!("{}: find failed: {}", self.name, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::StaticTransforms;
    use planefind_core::{PointCloud, RigidTransform};
    use std::time::{Duration, SystemTime};

    fn floor_frame(sequence: u64) -> CapturedFrame {
        let points = (0..40)
            .flat_map(|r| (0..40).map(move |c| (r, c)))
            .map(|(r, c)| Point3d::new(c as f64 * 0.02 - 0.4, r as f64 * 0.02 - 0.4, 1.0))
            .collect();
        let cloud = PointCloud::organized(40, 40, points)
            .unwrap()
            .with_stamp(SystemTime::UNIX_EPOCH + Duration::from_secs(100));
        CapturedFrame { sequence, cloud }
    }

    fn finder(config: PlaneFinderConfig) -> PlaneFinder {
        let transforms = StaticTransforms::new().with_transform("base_link", RigidTransform::identity());
        PlaneFinder::new("ground_plane_finder", config, Arc::new(transforms)).unwrap()
    }

    #[test]
    fn test_process_frame_builds_observation() {
        let finder = finder(PlaneFinderConfig {
            desired_normal: Some([0.0, 0.0, 1.0]),
            cos_normal_angle: 0.9,
            ..PlaneFinderConfig::default()
        });

        let frame = finder.process_frame(floor_frame(3)).unwrap();
        assert_eq!(frame.source_sequence, 3);
        assert_eq!(frame.observations.len(), 1);
        assert_eq!(frame.observations[0].points.len(), 60);
        assert_eq!(frame.observations[0].sensor_name, "camera");
        assert!(frame.observations[0].cloud.is_none());

        let reference = frame.reference_transform.unwrap();
        assert_eq!(reference.frame_id, "base_link");
        assert_eq!(reference.stamp, frame.stamp);
    }

    #[test]
    fn test_orientation_mismatch() {
        let finder = finder(PlaneFinderConfig {
            desired_normal: Some([1.0, 0.0, 0.0]),
            cos_normal_angle: 0.9,
            ..PlaneFinderConfig::default()
        });

        let err = finder.process_frame(floor_frame(0)).unwrap_err();
        assert!(matches!(err, Error::PlaneOrientationMismatch { min_cos, .. } if min_cos == 0.9));
    }

    #[test]
    fn test_orientation_accepts_flipped_normal() {
        let finder = finder(PlaneFinderConfig {
            desired_normal: Some([0.0, 0.0, 2.0]),
            cos_normal_angle: 0.99,
            ..PlaneFinderConfig::default()
        });
        let model = PlaneModel::new(Vector3d::new(0.0, 0.0, -1.0), -1.0).unwrap();

        let oriented = finder.check_orientation(&model).unwrap();
        assert_eq!(oriented.normal.z, 1.0);
        assert_eq!(oriented.offset, 1.0);
    }

    #[test]
    fn test_missing_transform_is_not_fatal() {
        let config = PlaneFinderConfig {
            transform_frame: "odom".to_string(),
            ..PlaneFinderConfig::default()
        };
        let frame = finder(config).process_frame(floor_frame(0)).unwrap();
        assert!(frame.reference_transform.is_none());
        assert_eq!(frame.observations[0].points.len(), 60);
    }

    #[test]
    fn test_invalid_config_rejected_at_init() {
        let config = PlaneFinderConfig { points_max: 0, ..PlaneFinderConfig::default() };
        let result = PlaneFinder::new("bad", config, Arc::new(StaticTransforms::new()));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_find_times_out_without_sensor() {
        let mut finder = finder(PlaneFinderConfig {
            frame_timeout_ms: 50,
            ..PlaneFinderConfig::default()
        });
        let err = finder.find().unwrap_err();
        assert!(matches!(err, Error::NoFrameReceived { .. }));
    }
}

//! Observation sampling
//!
//! Turns an extracted plane into a fixed-size observation. The selection is a
//! uniform stride over the ordered inlier sequence: sample `k` of `points_max`
//! is inlier `floor(k * n / points_max)`. This spreads the samples over the
//! whole plane and always returns the same points for the same input.

use planefind_core::{
    CalibrationObservation, DebugSink, Error, ObservedPoint, PlaneCloud, Point3d, Result,
};

/// Indices selected out of `count` inliers to keep exactly `points_max` samples
///
/// # Errors
/// * [`Error::InvalidConfig`] - `points_max` is zero
/// * [`Error::InsufficientSamples`] - fewer than `points_max` inliers
pub fn select_samples(count: usize, points_max: usize) -> Result<Vec<usize>> {
    if points_max == 0 {
        return Err(Error::InvalidConfig("points_max must be positive".to_string()));
    }
    if count < points_max {
        return Err(Error::InsufficientSamples {
            required: points_max,
            available: count,
        });
    }

    Ok((0..points_max)
        .map(|k| ((k as u128 * count as u128) / points_max as u128) as usize)
        .collect())
}

/// Build a calibration observation from a plane cloud
///
/// Keeps exactly `points_max` points, never fewer and never padded. Points of
/// an organized source keep their pixel. When `sink` is given, the selected
/// points are published to it; the sink cannot influence the result.
///
/// # Arguments
/// * `plane` - Inliers of the extracted plane
/// * `sensor_name` - Name stored in the observation
/// * `points_max` - Exact number of samples to emit
/// * `sink` - Optional debug publisher
///
/// # Example
/// ```rust
/// use planefind_core::{PlaneCloud, PointCloud, Point3d};
/// use planefind_algorithms::build_observation;
///
/// let cloud: PointCloud = (0..10).map(|i| Point3d::new(i as f64 * 0.1, 0.0, 1.0)).collect();
/// let plane = PlaneCloud::from_indices(&cloud, (0..10).collect()).unwrap();
///
/// let observation = build_observation(&plane, "camera", 4, None).unwrap();
/// assert_eq!(observation.points.len(), 4);
/// assert!(build_observation(&plane, "camera", 11, None).is_err());
/// ```
pub fn build_observation(
    plane: &PlaneCloud,
    sensor_name: &str,
    points_max: usize,
    sink: Option<&dyn DebugSink>,
) -> Result<CalibrationObservation> {
    let selected = select_samples(plane.len(), points_max)?;

    let points = selected
        .iter()
        .map(|&i| {
            plane
                .get(i)
                .map(|(position, pixel)| ObservedPoint { pixel, position })
                .ok_or_else(|| Error::InvalidData(format!("sample {} outside plane of {} points", i, plane.len())))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "selected {} of {} plane points for sensor '{}'",
        points.len(),
        plane.len(),
        sensor_name
    );

    if let Some(sink) = sink {
        let positions: Vec<Point3d> = points.iter().map(|p| p.position).collect();
        sink.publish(sensor_name, plane.frame_id(), &positions);
    }

    Ok(CalibrationObservation {
        sensor_name: sensor_name.to_string(),
        frame_id: plane.frame_id().to_string(),
        points,
        camera_info: None,
        cloud: None,
    })
}

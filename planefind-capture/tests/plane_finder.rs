//! Integration tests for the plane finder running against a sensor thread

use approx::assert_relative_eq;
use planefind_capture::*;
use planefind_core::{
    CameraIntrinsics, DebugSink, Error, Point3d, PointCloud, RigidTransform, Vector3,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

const WIDTH: u32 = 48;
const HEIGHT: u32 = 36;

/// A wall 1.5m in front of the camera with a band of missing returns
fn wall_frame(stamp_secs: u64) -> PointCloud {
    let mut points = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for row in 0..HEIGHT {
        for col in 0..WIDTH {
            let point = if row < 4 {
                Point3d::new(f64::NAN, f64::NAN, f64::NAN)
            } else {
                Point3d::new((col as f64 - 24.0) / 30.0, (row as f64 - 18.0) / 30.0, 1.5)
            };
            points.push(point);
        }
    }
    PointCloud::organized(WIDTH, HEIGHT, points)
        .unwrap()
        .with_stamp(SystemTime::UNIX_EPOCH + Duration::from_secs(stamp_secs))
        .with_frame_id("head_camera_depth_frame")
}

/// Pushes a frame every 5ms until stopped
struct Sensor {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Sensor {
    fn start(source: Arc<FrameSynchronizer>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            let mut stamp = 1_000;
            while flag.load(Ordering::SeqCst) {
                source.push(wall_frame(stamp));
                stamp += 1;
                thread::sleep(Duration::from_millis(5));
            }
        });
        Self { running, handle: Some(handle) }
    }
}

impl Drop for Sensor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    published: Mutex<Vec<(String, usize)>>,
}

impl DebugSink for RecordingSink {
    fn publish(&self, sensor_name: &str, _frame_id: &str, points: &[Point3d]) {
        self.published.lock().unwrap().push((sensor_name.to_string(), points.len()));
    }
}

fn transforms() -> Arc<StaticTransforms> {
    Arc::new(
        StaticTransforms::new()
            .with_transform("base_link", RigidTransform::translation(Vector3::new(0.1, 0.0, 1.1))),
    )
}

fn head_config() -> PlaneFinderConfig {
    PlaneFinderConfig {
        sensor_name: "head_camera".to_string(),
        points_max: 50,
        desired_normal: Some([0.0, 0.0, -1.0]),
        cos_normal_angle: 0.95,
        ransac_points: 200,
        frame_timeout_ms: 5_000,
        seed: 3,
        ..PlaneFinderConfig::default()
    }
}

#[test]
fn test_consecutive_finds_use_fresh_frames() {
    let mut finder = PlaneFinder::new("head_plane", head_config(), transforms()).unwrap();
    let _sensor = Sensor::start(finder.frame_source());

    let first = finder.find().unwrap();
    let second = finder.find().unwrap();

    assert!(second.source_sequence > first.source_sequence);
    assert!(second.stamp > first.stamp);

    for frame in [&first, &second] {
        let observation = &frame.observations[0];
        assert_eq!(observation.sensor_name, "head_camera");
        assert_eq!(observation.frame_id, "head_camera_depth_frame");
        assert_eq!(observation.points.len(), 50);
        for point in &observation.points {
            assert_relative_eq!(point.position.z, 1.5, epsilon = 1e-12);
            assert!(point.pixel.unwrap().row >= 4);
        }

        let reference = frame.reference_transform.as_ref().unwrap();
        assert_eq!(reference.frame_id, "base_link");
        assert_eq!(reference.stamp, frame.stamp);
        assert_relative_eq!(reference.transform.isometry.translation.vector.z, 1.1);
    }
}

#[test]
fn test_orientation_mismatch_from_sensor() {
    let config = PlaneFinderConfig {
        desired_normal: Some([0.0, 1.0, 0.0]),
        cos_normal_angle: 0.5,
        ..head_config()
    };
    let mut finder = PlaneFinder::new("head_plane", config, transforms()).unwrap();
    let _sensor = Sensor::start(finder.frame_source());

    let err = finder.find().unwrap_err();
    match err {
        Error::PlaneOrientationMismatch { cos_angle, min_cos } => {
            assert_relative_eq!(cos_angle, 0.0, epsilon = 1e-6);
            assert_eq!(min_cos, 0.5);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_bounding_box_leaves_too_few_points() {
    let config = PlaneFinderConfig {
        bounds: planefind_algorithms::BoundingBox { max_z: 1.0, ..Default::default() },
        ..head_config()
    };
    let mut finder = PlaneFinder::new("head_plane", config, transforms()).unwrap();
    let _sensor = Sensor::start(finder.frame_source());

    let err = finder.find().unwrap_err();
    assert!(matches!(err, Error::InsufficientInputPoints { available: 0, .. }));
}

#[test]
fn test_debug_output_and_camera_info() {
    let camera = CameraIntrinsics {
        width: WIDTH,
        height: HEIGHT,
        fx: 30.0,
        fy: 30.0,
        cx: 24.0,
        cy: 18.0,
    };
    let config = PlaneFinderConfig {
        output_debug: true,
        camera_info: Some(camera),
        ..head_config()
    };
    let sink = Arc::new(RecordingSink::default());
    let mut finder = PlaneFinder::new("head_plane", config, transforms())
        .unwrap()
        .with_debug_sink(sink.clone());
    let _sensor = Sensor::start(finder.frame_source());

    let frame = finder.find().unwrap();
    let observation = &frame.observations[0];

    assert_eq!(observation.camera_info, Some(camera));
    let cloud = observation.cloud.as_ref().unwrap();
    assert_eq!(cloud.len(), (WIDTH * (HEIGHT - 4)) as usize);

    let published = sink.published.lock().unwrap();
    assert_eq!(published.as_slice(), &[("head_camera".to_string(), 50)]);
}

#[test]
fn test_registry_from_json_file() {
    let path = std::env::temp_dir().join(format!("planefind_finders_{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "head_plane": {
                "type": "plane",
                "sensor_name": "head_camera",
                "points_max": 30,
                "ransac_points": 200,
                "frame_timeout_ms": 5000
            }
        }"#,
    )
    .unwrap();
    let config = load_finders_json(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut registry = FinderRegistry::from_config(&config, transforms()).unwrap();
    let _sensor = Sensor::start(registry.frame_source("head_plane").unwrap());

    let frame = registry.capture_all().unwrap();
    assert_eq!(frame.observations.len(), 1);
    assert_eq!(frame.observations[0].points.len(), 30);
    assert!(frame.reference_transform.is_some());
}

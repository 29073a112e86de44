//! Plane finder demo
//!
//! Runs a plane finder against a simulated depth camera looking at a floor
//! with some clutter on it, and prints or saves the calibration frames.
//!
//! ```text
//! RUST_LOG=info cargo run --bin plane_finder_demo -- --frames 5 --noise 0.005
//! ```

use anyhow::{ensure, Context, Result};
use clap::Parser;
use planefind_capture::{FeatureFinder, FrameSynchronizer, PlaneFinder, PlaneFinderConfig, StaticTransforms};
use planefind_core::{
    CalibrationObservation, Point3d, PointCloud, RigidTransform, UnitQuaternion, Vector3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

const WIDTH: u32 = 80;
const HEIGHT: u32 = 60;
const FLOOR_DEPTH: f64 = 1.2;

/// Find the floor plane in a simulated depth camera stream
#[derive(Debug, Parser)]
#[command(author, version, about = "Plane finder on a simulated depth camera")]
struct Args {
    /// Optional JSON PlaneFinderConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to capture
    #[arg(long, default_value_t = 3)]
    frames: usize,

    /// Sensor publishing period in milliseconds
    #[arg(long, default_value_t = 33)]
    period_ms: u64,

    /// Uniform depth noise amplitude in meters
    #[arg(long, default_value_t = 0.003)]
    noise: f64,

    /// Write the captured frames to this file as pretty JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

/// One depth image of the floor, a crate standing on it and some missing returns
fn simulated_depth_image(rng: &mut StdRng, noise: f64) -> PointCloud {
    let mut points = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for row in 0..HEIGHT {
        for col in 0..WIDTH {
            let u = (col as f64 - WIDTH as f64 / 2.0) / 60.0;
            let v = (row as f64 - HEIGHT as f64 / 2.0) / 60.0;

            let point = if rng.gen_bool(0.03) {
                Point3d::new(f64::NAN, f64::NAN, f64::NAN)
            } else {
                let depth = if (50..70).contains(&col) && (35..55).contains(&row) {
                    FLOOR_DEPTH - 0.35
                } else {
                    FLOOR_DEPTH
                };
                let z = depth + rng.gen_range(-noise..=noise);
                Point3d::new(u * z, v * z, z)
            };
            points.push(point);
        }
    }

    PointCloud::organized(WIDTH, HEIGHT, points)
        .map(|cloud| cloud.with_frame_id("camera_depth_optical_frame").with_stamp(SystemTime::now()))
        .unwrap_or_default()
}

fn load_config(path: Option<&PathBuf>) -> Result<PlaneFinderConfig> {
    match path {
        Some(path) => PlaneFinderConfig::load_json(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(PlaneFinderConfig {
            desired_normal: Some([0.0, 0.0, -1.0]),
            cos_normal_angle: 0.9,
            ransac_points: 1000,
            ..PlaneFinderConfig::default()
        }),
    }
}

/// Mean z of the observed points once moved into the reference frame
fn mean_height(observation: &CalibrationObservation, sensor_to_reference: &RigidTransform) -> f64 {
    if observation.is_empty() {
        return 0.0;
    }
    let sum: f64 = observation
        .points
        .iter()
        .map(|p| sensor_to_reference.transform_point(&p.position).z)
        .sum();
    sum / observation.len() as f64
}

fn spawn_sensor(
    source: Arc<FrameSynchronizer>,
    running: Arc<AtomicBool>,
    period: Duration,
    noise: f64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(42);
        while running.load(Ordering::SeqCst) {
            let sequence = source.push(simulated_depth_image(&mut rng, noise));
            log::debug!("sensor published frame {}", sequence);
            thread::sleep(period);
        }
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.noise >= 0.0 && args.noise.is_finite(), "--noise must be non-negative");

    let config = load_config(args.config.as_ref())?;

    // Camera 1.2m above the floor, looking straight down.
    let camera_in_base = RigidTransform::from_translation_rotation(
        Vector3::new(0.0, 0.0, FLOOR_DEPTH),
        UnitQuaternion::from_euler_angles(std::f64::consts::PI, 0.0, 0.0),
    );
    let transforms = StaticTransforms::new().with_transform(&config.transform_frame, camera_in_base);

    let mut finder = PlaneFinder::new("ground_plane_finder", config, Arc::new(transforms))?;

    let running = Arc::new(AtomicBool::new(true));
    let sensor = spawn_sensor(
        finder.frame_source(),
        Arc::clone(&running),
        Duration::from_millis(args.period_ms),
        args.noise,
    );

    let mut frames = Vec::with_capacity(args.frames);
    let mut failures = 0;
    for _ in 0..args.frames {
        match finder.find() {
            Ok(frame) => {
                let observation = &frame.observations[0];
                println!(
                    "frame {}: {} points from '{}'",
                    frame.source_sequence,
                    observation.points.len(),
                    observation.sensor_name
                );
                if let Some(reference) = &frame.reference_transform {
                    println!(
                        "  mean height in {}: {:.4} m",
                        reference.frame_id,
                        mean_height(observation, &reference.transform)
                    );
                }
                frames.push(frame);
            }
            Err(e) => {
                println!("find failed: {}", e);
                failures += 1;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    if sensor.join().is_err() {
        log::error!("sensor thread panicked");
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&frames)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {} frames to {}", frames.len(), path.display());
    }

    println!("{} of {} finds succeeded", frames.len(), frames.len() + failures);
    Ok(())
}

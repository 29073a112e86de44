use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use planefind_algorithms::{extract_plane, remove_invalid_points, BoundingBox, RansacParams};
use planefind_core::{Point3d, PointCloud};
use rand::prelude::*;
use rand::rngs::StdRng;

const CLOUD_SIZES: [usize; 3] = [10_000, 50_000, 200_000];

/// Noisy floor 1m below the sensor plus uniform clutter
fn synthetic_cloud(size: usize) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(11);
    (0..size)
        .map(|i| {
            if i % 4 == 0 {
                Point3d::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), rng.gen_range(0.2..1.8))
            } else {
                Point3d::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), 1.0 + rng.gen_range(-0.005..0.005))
            }
        })
        .collect()
}

fn plane_extraction(c: &mut Criterion) {
    let params = RansacParams {
        iterations: 100,
        tolerance: 0.02,
        min_inliers: 100,
        initial_sampling_distance: 0.2,
        ..RansacParams::default()
    };

    let mut g = c.benchmark_group("plane extraction");
    g.sample_size(10);

    for size in CLOUD_SIZES {
        let mut cloud = synthetic_cloud(size);
        remove_invalid_points(&mut cloud, &BoundingBox::default());

        g.bench_with_input(BenchmarkId::from_parameter(size), &cloud, |b, cloud| {
            b.iter(|| extract_plane(std::hint::black_box(cloud), std::hint::black_box(&params)));
        });
    }

    g.finish();
}

criterion_group!(benches, plane_extraction);
criterion_main!(benches);

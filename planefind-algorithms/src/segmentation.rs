//! Segmentation algorithms

use nalgebra::{Matrix3, SymmetricEigen, Unit};
use planefind_core::{Error, PlaneCloud, Point3d, PointCloud, Result, Vector3d};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum sine of the angle between the two edges of a 3-point sample
const MIN_SAMPLE_SINE: f64 = 1e-9;

/// Minimum ratio of the middle to the largest covariance eigenvalue for a
/// least-squares fit; below it the points are (nearly) collinear
const MIN_EIGEN_RATIO: f64 = 1e-12;

/// A 3D plane defined by `normal · p = offset`, with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneModel {
    pub normal: Unit<Vector3d>,
    pub offset: f64,
}

impl PlaneModel {
    /// Create a plane from any non-zero normal and an offset along it
    pub fn new(normal: Vector3d, offset: f64) -> Option<Self> {
        let norm = normal.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return None;
        }
        Some(Self {
            normal: Unit::new_unchecked(normal / norm),
            offset: offset / norm,
        })
    }

    /// Create the plane through `point` with the given normal
    pub fn from_normal_and_point(normal: Vector3d, point: &Point3d) -> Option<Self> {
        let normal = Unit::try_new(normal, f64::EPSILON)?;
        let offset = normal.dot(&point.coords);
        Some(Self { normal, offset })
    }

    /// Create a plane model from three points
    ///
    /// Returns `None` when the points are (nearly) collinear.
    pub fn from_points(p1: &Point3d, p2: &Point3d, p3: &Point3d) -> Option<Self> {
        let v1 = p2 - p1;
        let v2 = p3 - p1;
        let normal = v1.cross(&v2);

        let scale = v1.norm() * v2.norm();
        if !(scale > 0.0) || normal.norm() < MIN_SAMPLE_SINE * scale {
            return None;
        }

        Self::from_normal_and_point(normal, p1)
    }

    /// Least-squares plane through a set of points
    ///
    /// The normal is the eigenvector of the smallest eigenvalue of the point
    /// covariance. Returns `None` for fewer than three points or collinear sets.
    pub fn fit_least_squares(points: &[Point3d]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let centroid = points
            .iter()
            .fold(Vector3d::zeros(), |acc, p| acc + p.coords)
            / points.len() as f64;

        let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
            let d = p.coords - centroid;
            acc + d * d.transpose()
        });

        let eigen = SymmetricEigen::new(covariance);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let [smallest, middle, largest] = order;

        let largest_value = eigen.eigenvalues[largest];
        if !(largest_value > 0.0) || eigen.eigenvalues[middle] <= MIN_EIGEN_RATIO * largest_value {
            return None;
        }

        let normal = eigen.eigenvectors.column(smallest).into_owned();
        Self::from_normal_and_point(normal, &Point3d::from(centroid))
    }

    /// Signed distance from the plane, positive on the side the normal points to
    #[inline]
    pub fn signed_distance(&self, point: &Point3d) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Perpendicular distance from a point to the plane
    #[inline]
    pub fn distance_to_point(&self, point: &Point3d) -> f64 {
        self.signed_distance(point).abs()
    }

    /// The same plane with the opposite normal
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// The same plane with its normal pointing towards the sensor origin
    pub fn canonical(&self) -> Self {
        if self.offset > 0.0 {
            self.flipped()
        } else {
            *self
        }
    }

    /// The same plane with its normal on the same side as `direction`
    pub fn oriented_towards(&self, direction: &Vector3d) -> Self {
        if self.normal.dot(direction) < 0.0 {
            self.flipped()
        } else {
            *self
        }
    }

    /// Cosine of the angle between the normal and `direction`
    pub fn cos_angle_to(&self, direction: &Vector3d) -> f64 {
        let norm = direction.norm();
        if norm < f64::EPSILON {
            return 0.0;
        }
        self.normal.dot(direction) / norm
    }

    /// Count the points among `candidates` within `tolerance` of the plane
    pub fn count_inliers(&self, points: &[Point3d], candidates: &[usize], tolerance: f64) -> usize {
        candidates
            .par_iter()
            .filter(|&&i| self.distance_to_point(&points[i]) <= tolerance)
            .count()
    }

    /// Indices of the points among `candidates` within `tolerance`, in candidate order
    pub fn inlier_indices(&self, points: &[Point3d], candidates: &[usize], tolerance: f64) -> Vec<usize> {
        candidates
            .par_iter()
            .copied()
            .filter(|&i| self.distance_to_point(&points[i]) <= tolerance)
            .collect()
    }
}

/// Parameters of the RANSAC plane search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Number of sampling trials
    pub iterations: usize,
    /// Points drawn per trial, at least 3
    pub sample_size: usize,
    /// Maximum perpendicular distance of an inlier
    pub tolerance: f64,
    /// Minimum inlier count for the best plane to be accepted
    pub min_inliers: usize,
    /// When positive, all sample points after the first are drawn within
    /// this distance of the first one
    pub initial_sampling_distance: f64,
    /// Seed of the sampling generator
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            sample_size: 3,
            tolerance: 0.02,
            min_inliers: 35,
            initial_sampling_distance: 0.2,
            seed: 0,
        }
    }
}

impl RansacParams {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::InvalidConfig("RANSAC iterations must be positive".to_string()));
        }
        if self.sample_size < 3 {
            return Err(Error::InvalidConfig("RANSAC sample size must be at least 3".to_string()));
        }
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(Error::InvalidConfig("Plane tolerance must be positive".to_string()));
        }
        if self.initial_sampling_distance.is_nan() {
            return Err(Error::InvalidConfig("Initial sampling distance is NaN".to_string()));
        }
        Ok(())
    }
}

/// Result of a successful plane extraction
#[derive(Debug, Clone)]
pub struct PlaneExtraction {
    /// Plane refined over all inliers, normal pointing towards the sensor origin
    pub model: PlaneModel,
    /// Inliers of the winning candidate, in cloud order
    pub plane: PlaneCloud,
    /// Number of non-degenerate candidates evaluated
    pub trials: usize,
    /// Trial index that produced the winning candidate
    pub best_trial: usize,
}

impl PlaneExtraction {
    pub fn inlier_count(&self) -> usize {
        self.plane.len()
    }
}

/// Plane extraction using RANSAC
///
/// Searches the valid points of `cloud` for the plane with the most inliers.
/// Sampling is driven by a generator seeded from `params.seed`, so a given
/// cloud and parameter set always yields the same plane. Ties keep the
/// candidate found first. The winner is refit by least squares over its inliers.
///
/// # Arguments
/// * `cloud` - Filtered input cloud; invalid points are ignored
/// * `params` - Trial budget, sample size, tolerance and acceptance threshold
///
/// # Returns
/// * `Result<PlaneExtraction>` - Refined plane and its inlier cloud
///
/// # Errors
/// * [`Error::InsufficientInputPoints`] - fewer valid points than `sample_size`
/// * [`Error::InsufficientPlaneFit`] - best plane has fewer than `min_inliers` inliers
pub fn extract_plane(cloud: &PointCloud, params: &RansacParams) -> Result<PlaneExtraction> {
    params.validate()?;

    let candidates = cloud.valid_indices();
    if candidates.len() < params.sample_size {
        return Err(Error::InsufficientInputPoints {
            required: params.sample_size,
            available: candidates.len(),
        });
    }

    let points = cloud.points();
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut sample = Vec::with_capacity(params.sample_size);
    let mut neighborhood = Vec::new();

    let mut best: Option<(PlaneModel, usize, usize)> = None;
    let mut evaluated = 0;

    for trial in 0..params.iterations {
        if !draw_sample(&mut rng, points, &candidates, params, &mut sample, &mut neighborhood) {
            continue;
        }

        let Some(model) = fit_sample(points, &sample) else {
            continue;
        };
        evaluated += 1;

        let inliers = model.count_inliers(points, &candidates, params.tolerance);
        if best.as_ref().map_or(true, |(_, count, _)| inliers > *count) {
            best = Some((model, inliers, trial));
        }
    }

    let (model, count, best_trial) = match best {
        Some(best) => best,
        None => {
            return Err(Error::InsufficientPlaneFit {
                inliers: 0,
                required: params.min_inliers,
            })
        }
    };

    log::debug!(
        "RANSAC: {} of {} trials evaluated, best plane has {} inliers (trial {})",
        evaluated,
        params.iterations,
        count,
        best_trial
    );

    if count < params.min_inliers {
        return Err(Error::InsufficientPlaneFit {
            inliers: count,
            required: params.min_inliers,
        });
    }

    let inliers = model.inlier_indices(points, &candidates, params.tolerance);
    let inlier_points: Vec<Point3d> = inliers.iter().map(|&i| points[i]).collect();
    let refined = PlaneModel::fit_least_squares(&inlier_points)
        .unwrap_or(model)
        .canonical();

    Ok(PlaneExtraction {
        model: refined,
        plane: PlaneCloud::from_indices(cloud, inliers)?,
        trials: evaluated,
        best_trial,
    })
}

/// Draw `params.sample_size` distinct candidate indices into `sample`
///
/// Returns `false` when the first point has too few neighbours within the
/// initial sampling distance.
fn draw_sample(
    rng: &mut StdRng,
    points: &[Point3d],
    candidates: &[usize],
    params: &RansacParams,
    sample: &mut Vec<usize>,
    neighborhood: &mut Vec<usize>,
) -> bool {
    sample.clear();

    if params.initial_sampling_distance <= 0.0 {
        sample.extend(
            index::sample(rng, candidates.len(), params.sample_size)
                .into_iter()
                .map(|i| candidates[i]),
        );
        return true;
    }

    let first = candidates[rng.gen_range(0..candidates.len())];
    let origin = points[first];
    let max_sq = params.initial_sampling_distance * params.initial_sampling_distance;

    neighborhood.clear();
    neighborhood.extend(
        candidates
            .iter()
            .copied()
            .filter(|&i| i != first && (points[i] - origin).norm_squared() <= max_sq),
    );

    let needed = params.sample_size - 1;
    if neighborhood.len() < needed {
        return false;
    }

    sample.push(first);
    sample.extend(
        index::sample(rng, neighborhood.len(), needed)
            .into_iter()
            .map(|i| neighborhood[i]),
    );
    true
}

/// Fit a candidate plane through sampled indices
fn fit_sample(points: &[Point3d], sample: &[usize]) -> Option<PlaneModel> {
    if let [a, b, c] = sample {
        return PlaneModel::from_points(&points[*a], &points[*b], &points[*c]);
    }
    let sampled: Vec<Point3d> = sample.iter().map(|&i| points[i]).collect();
    PlaneModel::fit_least_squares(&sampled)
}

//! Rigid transformation utilities

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A rigid (rotation + translation) transformation between coordinate frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub isometry: Isometry3<f64>,
}

impl RigidTransform {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f64>) -> Self {
        Self {
            isometry: Isometry3::from_parts(Translation3::from(translation), UnitQuaternion::identity()),
        }
    }

    /// Create a transformation from translation and rotation
    pub fn from_translation_rotation(
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self {
            isometry: Isometry3::from_parts(translation.into(), rotation),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.isometry.transform_point(point)
    }
}

/// A transform resolved for a named frame at a given time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedTransform {
    /// Frame the transform was looked up for
    pub frame_id: String,
    pub stamp: SystemTime,
    pub transform: RigidTransform,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_point() {
        let t = RigidTransform::from_translation_rotation(
            Vector3::new(0.0, 0.0, 1.2),
            UnitQuaternion::from_euler_angles(std::f64::consts::PI, 0.0, 0.0),
        );
        let p = t.transform_point(&Point3::new(0.5, 0.25, 1.2));
        assert_relative_eq!(p, Point3::new(0.5, -0.25, 0.0), epsilon = 1e-12);

        let shifted = RigidTransform::translation(Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(shifted.transform_point(&Point3::origin()), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(RigidTransform::identity().transform_point(&p), p);
    }
}

//! Table-backed transform lookup

use planefind_core::{Error, Result, RigidTransform, TransformLookup};
use std::collections::HashMap;
use std::time::SystemTime;

/// Fixed transforms keyed by frame name, valid at all times
///
/// Useful for rigs whose frames do not move during capture, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTransforms {
    frames: HashMap<String, RigidTransform>,
}

impl StaticTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`StaticTransforms::insert`]
    pub fn with_transform(mut self, frame: &str, transform: RigidTransform) -> Self {
        self.insert(frame, transform);
        self
    }

    pub fn insert(&mut self, frame: &str, transform: RigidTransform) {
        self.frames.insert(frame.to_string(), transform);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl TransformLookup for StaticTransforms {
    fn lookup_transform(&self, target_frame: &str, _stamp: SystemTime) -> Result<RigidTransform> {
        self.frames
            .get(target_frame)
            .copied()
            .ok_or_else(|| Error::TransformUnavailable {
                frame: target_frame.to_string(),
                reason: "frame is not in the static table".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planefind_core::Vector3;

    #[test]
    fn test_lookup_known_and_unknown() {
        let t = RigidTransform::translation(Vector3::new(0.0, 0.0, 1.0));
        let table = StaticTransforms::new().with_transform("base_link", t);

        assert_eq!(table.lookup_transform("base_link", SystemTime::now()).unwrap(), t);
        let err = table.lookup_transform("odom", SystemTime::now()).unwrap_err();
        assert!(matches!(err, Error::TransformUnavailable { ref frame, .. } if frame == "odom"));
    }
}

//! Registry of feature finders
//!
//! Finders are registered under a name and can be run one at a time or all
//! together. A capture configuration maps names to tagged finder configs, so
//! a whole rig can be set up from one JSON file.

use crate::config::{FinderConfig, FindersConfig};
use crate::finder::{FeatureFinder, PlaneFinder};
use crate::sync::FrameSynchronizer;
use planefind_core::{CalibrationFrame, Error, Result, TransformLookup};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Feature finders keyed by name, iterated in name order
pub struct FinderRegistry {
    finders: BTreeMap<String, Box<dyn FeatureFinder>>,
    frame_sources: BTreeMap<String, Arc<FrameSynchronizer>>,
}

impl FinderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            finders: BTreeMap::new(),
            frame_sources: BTreeMap::new(),
        }
    }

    /// Build one finder per entry of a capture configuration
    ///
    /// Names are matched case-insensitively, so entries differing only in
    /// case are rejected.
    pub fn from_config(config: &FindersConfig, transforms: Arc<dyn TransformLookup>) -> Result<Self> {
        let mut registry = Self::new();
        for (name, finder_config) in config {
            if registry.finders.contains_key(&name.to_lowercase()) {
                return Err(Error::InvalidConfig(format!(
                    "finder name '{}' collides with another finder once lower-cased",
                    name
                )));
            }
            match finder_config {
                FinderConfig::Plane(plane_config) => {
                    let finder = PlaneFinder::new(name.as_str(), plane_config.clone(), Arc::clone(&transforms))?;
                    registry.register_plane_finder(finder);
                }
            }
            log::debug!("registered {} finder '{}'", finder_config.kind(), name);
        }
        Ok(registry)
    }

    /// Register a finder under its own name, replacing any finder of that name
    pub fn register(&mut self, finder: Box<dyn FeatureFinder>) {
        let name = finder.name().to_lowercase();
        self.frame_sources.remove(&name);
        self.finders.insert(name, finder);
    }

    /// Register a plane finder and keep its frame source reachable by name
    pub fn register_plane_finder(&mut self, finder: PlaneFinder) {
        let name = finder.name().to_lowercase();
        let source = finder.frame_source();
        self.register(Box::new(finder));
        self.frame_sources.insert(name, source);
    }

    /// The synchronizer a sensor callback should push into for `name`
    pub fn frame_source(&self, name: &str) -> Option<Arc<FrameSynchronizer>> {
        self.frame_sources.get(&name.to_lowercase()).cloned()
    }

    pub fn get(&self, name: &str) -> Option<&dyn FeatureFinder> {
        self.finders.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn FeatureFinder>> {
        self.finders.get_mut(&name.to_lowercase())
    }

    /// Registered finder names, in the order [`FinderRegistry::capture_all`] runs them
    pub fn names(&self) -> Vec<String> {
        self.finders.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }

    /// Run a single finder
    pub fn find(&mut self, name: &str) -> Result<CalibrationFrame> {
        self.get_mut(name)
            .ok_or_else(|| Error::UnknownFinder(name.to_string()))?
            .find()
    }

    /// Run every finder and merge their observations into one frame
    ///
    /// The first finder, in name order, that produced a reference transform
    /// provides the frame's transform, stamp and sequence number. Stops at the
    /// first failing finder.
    pub fn capture_all(&mut self) -> Result<CalibrationFrame> {
        let mut merged: Option<CalibrationFrame> = None;

        for (name, finder) in self.finders.iter_mut() {
            let frame = finder.find()?;
            log::debug!("{}: {} observations", name, frame.observations.len());

            match merged.as_mut() {
                None => merged = Some(frame),
                Some(merged) => {
                    if merged.reference_transform.is_none() && frame.reference_transform.is_some() {
                        merged.reference_transform = frame.reference_transform;
                        merged.stamp = frame.stamp;
                        merged.source_sequence = frame.source_sequence;
                    }
                    merged.observations.extend(frame.observations);
                }
            }
        }

        merged.ok_or_else(|| Error::InvalidConfig("no finders registered".to_string()))
    }
}

impl Default for FinderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! # planefind capture
//!
//! Runtime side of the plane finder: the single-slot frame synchronizer fed
//! by the sensor callback, the configuration, the [`PlaneFinder`] controller
//! and the registry that instantiates feature finders by name.

pub mod config;
pub mod finder;
pub mod registry;
pub mod sync;
pub mod transforms;

pub use config::*;
pub use finder::*;
pub use registry::*;
pub use sync::*;
pub use transforms::*;

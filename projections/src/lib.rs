//! Projections is a registry of coordinate reference systems and an engine to transform coordinates between them.
//!
//! # Quick start
//!
//! ```no_run
//! use projections::Registry;
//!
//! let registry = Registry::global();
//! let transformation = registry.transformation("EPSG:4326", "EPSG:3857").unwrap();
//! let (x, y) = transformation.transform(8.4037, 49.0069).unwrap();
//! ```
//!
//! # Main components
//!
//! * [`CoordinateReferenceSystem`] is a named definition of what numeric coordinates mean. It is created from
//!   PROJ.4 style parameter text, optionally with a [`CustomTransformation`](custom::CustomTransformation) chain of
//!   numeric corrections, and creates its backend handle only when it is first used.
//! * [`Registry`] finds systems by case-insensitive identifiers and follows aliases. Besides a few hand-registered
//!   systems it carries a bundled reference database, which is loaded the first time a lookup misses.
//! * [`Transformation`] converts single points, parallel arrays and arbitrary objects from one system into another.
//!   It uses a hand-coded [`DirectTransform`] when the registry knows one for the pair, and the
//!   [`backend`](backend::ProjectionBackend) otherwise.
//!
//! Systems and the registry never fail loudly. A system that cannot be initialized is just invalid and an unknown
//! identifier is just absent; both become a [`ProjectionError`] only when a transformation is requested.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod backend;
pub mod crs;
pub mod custom;
mod distance;
pub mod error;
pub mod registry;
pub mod transformation;

#[cfg(test)]
mod tests;

pub use crs::CoordinateReferenceSystem;
pub use distance::haversine_distance;
pub use error::ProjectionError;
pub use registry::{Registry, RegistryBuilder};
pub use transformation::{DirectTransform, Transformation};

// Reexport projections_types
pub use projections_types;

//! Point types used by the `projections` engine.
//!
//! The engine itself works on plain `f64` coordinates. This crate contains the small set of point types that are
//! convenient to pass into it, and the [`Coordinates`] trait that lets any of them (or a user type) be transformed
//! in place by an object-sequence transformation.

pub mod cartesian;
mod coordinates;
pub mod geo;
mod location;

#[cfg(feature = "geo-types")]
mod geo_types;

pub use coordinates::Coordinates;
pub use location::Location;

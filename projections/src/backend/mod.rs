//! Boundary to the library that does the actual projection math.
//!
//! The engine never looks into a backend handle. It creates handles from parameter text, asks whether a handle
//! describes a latitude/longitude system, and hands pairs of handles with coordinate buffers back to the backend.
//! Every failure on this boundary is expressed as an absent handle or a `false` result.

use std::any::Any;

mod proj4;

pub use proj4::Proj4Backend;

/// Opaque handle of one coordinate system, created by a [`ProjectionBackend`].
///
/// The handle is released when it is dropped.
pub trait NativeProjection: Send + Sync {
    /// Returns true if the coordinate system is geographic (latitude/longitude). Geographic coordinates are passed
    /// to and from the backend in radians.
    fn is_angular(&self) -> bool;

    /// Allows the backend to get its own handle type back.
    fn as_any(&self) -> &dyn Any;
}

/// Projection library used by the coordinate systems of a [`Registry`](crate::Registry).
pub trait ProjectionBackend: Send + Sync {
    /// Creates a handle from PROJ.4 style parameter text. Returns `None` if the parameters are not understood.
    fn create_handle(&self, parameters: &str) -> Option<Box<dyn NativeProjection>>;

    /// Transforms the coordinates in place from the `source` to the `target` system.
    ///
    /// All slices have the same length. Returns false if the handles were not created by this backend or if any of
    /// the points could not be transformed. The content of the buffers is unspecified in that case.
    fn transform_points(
        &self,
        source: &dyn NativeProjection,
        target: &dyn NativeProjection,
        x: &mut [f64],
        y: &mut [f64],
        z: Option<&mut [f64]>,
    ) -> bool;
}

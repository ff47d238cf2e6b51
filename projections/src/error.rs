//! Error types used by the crate.

use thiserror::Error;

/// Projections error type.
///
/// Coordinate systems and the registry never fail loudly: a system that cannot be initialized is just invalid and an
/// unknown identifier is just absent. These conditions become an error only when a caller asks for a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// No viable transformation between the two identifiers: one of them is unknown, its alias chain is broken or
    /// cyclic, its backend handle could not be created, or the backend failed to transform the coordinates.
    #[error("transformation from '{from}' to '{to}' not found")]
    TransformationNotFound {
        /// Identifier of the source coordinate system.
        from: String,
        /// Identifier of the target coordinate system.
        to: String,
    },
    /// Arguments of a transform call are inconsistent. Raised before any coordinate is touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ProjectionError {
    pub(crate) fn not_found(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::TransformationNotFound {
            from: from.into(),
            to: to.into(),
        }
    }
}

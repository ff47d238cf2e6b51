use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Hand-coded transformation between two specific coordinate systems.
///
/// Direct transformations do not need a backend handle and are used by a [`Transformation`](super::Transformation)
/// whenever one is registered for the identifier pair. The `z` coordinate is passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectTransform {
    /// Coordinates are not changed.
    Identity,
    /// Longitude/latitude in degrees to spherical mercator meters.
    GeographicToMercator {
        /// Radius of the sphere in meters.
        radius: f64,
    },
    /// Spherical mercator meters to longitude/latitude in degrees.
    MercatorToGeographic {
        /// Radius of the sphere in meters.
        radius: f64,
    },
    /// Both coordinates are multiplied by the factor.
    Scale {
        /// Multiplier.
        factor: f64,
    },
}

impl DirectTransform {
    /// Transforms a single point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            DirectTransform::Identity => (x, y),
            DirectTransform::GeographicToMercator { radius } => (
                radius * x.to_radians(),
                radius * (FRAC_PI_4 + y.to_radians() / 2.0).tan().ln(),
            ),
            DirectTransform::MercatorToGeographic { radius } => (
                (x / radius).to_degrees(),
                (2.0 * (y / radius).exp().atan() - FRAC_PI_2).to_degrees(),
            ),
            DirectTransform::Scale { factor } => (x * factor, y * factor),
        }
    }

    /// Transformation in the opposite direction.
    pub fn inverse(&self) -> Self {
        match *self {
            DirectTransform::Identity => DirectTransform::Identity,
            DirectTransform::GeographicToMercator { radius } => {
                DirectTransform::MercatorToGeographic { radius }
            }
            DirectTransform::MercatorToGeographic { radius } => {
                DirectTransform::GeographicToMercator { radius }
            }
            DirectTransform::Scale { factor } => DirectTransform::Scale {
                factor: 1.0 / factor,
            },
        }
    }
}

use crate::Coordinates;
use serde::{Deserialize, Serialize};

/// A position given in the units of some coordinate reference system, with an optional height.
///
/// Unlike [`GeoPoint2d`](crate::geo::GeoPoint2d) a location does not know what its coordinates mean, it is only
/// interpreted together with the identifier of the coordinate system it was measured in.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct Location {
    /// First coordinate (easting or longitude).
    pub x: f64,
    /// Second coordinate (northing or latitude).
    pub y: f64,
    /// Optional height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Location {
    /// Creates a new 2d location.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Creates a new location with height.
    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl Coordinates for Location {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (self.x, self.y, self.z)
    }

    fn set_coordinates(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.x = x;
        self.y = y;
        self.z = z;
    }
}

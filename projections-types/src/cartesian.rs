//! Points in projected (cartesian) coordinates.

use crate::Coordinates;
pub use nalgebra::{Point2, Point3};

/// 2d point with `f64` coordinates.
pub type Point2d = Point2<f64>;
/// 3d point with `f64` coordinates.
pub type Point3d = Point3<f64>;

impl Coordinates for Point2d {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (self.x, self.y, None)
    }

    fn set_coordinates(&mut self, x: f64, y: f64, _z: Option<f64>) {
        self.x = x;
        self.y = y;
    }
}

impl Coordinates for Point3d {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (self.x, self.y, Some(self.z))
    }

    fn set_coordinates(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.x = x;
        self.y = y;
        if let Some(z) = z {
            self.z = z;
        }
    }
}

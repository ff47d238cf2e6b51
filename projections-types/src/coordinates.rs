/// Read and write access to the numeric coordinates of a point-like value.
///
/// The order of the values is always `x, y, z`. For geographic points this means `longitude, latitude, height`.
/// Types that do not carry a third dimension return `None` for `z` and ignore it when written back.
pub trait Coordinates {
    /// Returns `x`, `y` and optional `z` of the value.
    fn coordinates(&self) -> (f64, f64, Option<f64>);

    /// Replaces the coordinates of the value.
    fn set_coordinates(&mut self, x: f64, y: f64, z: Option<f64>);

    /// Returns true if the value carries a `z` coordinate.
    fn has_z(&self) -> bool {
        self.coordinates().2.is_some()
    }
}

impl Coordinates for (f64, f64) {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (self.0, self.1, None)
    }

    fn set_coordinates(&mut self, x: f64, y: f64, _z: Option<f64>) {
        self.0 = x;
        self.1 = y;
    }
}

impl Coordinates for (f64, f64, f64) {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (self.0, self.1, Some(self.2))
    }

    fn set_coordinates(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.0 = x;
        self.1 = y;
        if let Some(z) = z {
            self.2 = z;
        }
    }
}

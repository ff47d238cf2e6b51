use geo_types::{Coord, CoordFloat, Point};
use num_traits::NumCast;

use crate::geo::{GeoPoint, NewGeoPoint};
use crate::Coordinates;

impl<T: CoordFloat> GeoPoint for Coord<T> {
    type Num = T;

    fn lat(&self) -> Self::Num {
        self.y
    }

    fn lon(&self) -> Self::Num {
        self.x
    }
}

impl<T: CoordFloat> NewGeoPoint<T> for Coord<T> {
    fn latlon(lat: T, lon: T) -> Self {
        Coord { x: lon, y: lat }
    }
}

impl<T: CoordFloat> GeoPoint for Point<T> {
    type Num = T;

    fn lat(&self) -> Self::Num {
        self.y()
    }

    fn lon(&self) -> Self::Num {
        self.x()
    }
}

impl<T: CoordFloat> NewGeoPoint<T> for Point<T> {
    fn latlon(lat: T, lon: T) -> Self {
        Point::new(lon, lat)
    }
}

impl<T: CoordFloat> Coordinates for Coord<T> {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (
            NumCast::from(self.x).unwrap_or(f64::NAN),
            NumCast::from(self.y).unwrap_or(f64::NAN),
            None,
        )
    }

    fn set_coordinates(&mut self, x: f64, y: f64, _z: Option<f64>) {
        self.x = NumCast::from(x).unwrap_or_else(T::nan);
        self.y = NumCast::from(y).unwrap_or_else(T::nan);
    }
}

impl<T: CoordFloat> Coordinates for Point<T> {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        self.0.coordinates()
    }

    fn set_coordinates(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.0.set_coordinates(x, y, z);
    }
}

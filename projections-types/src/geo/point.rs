use crate::geo::Datum;
use crate::Coordinates;
use num_traits::{Float, NumCast, One};
use serde::{Deserialize, Serialize};

/// Point on the surface of a celestial body, in degrees.
pub trait GeoPoint {
    /// Numeric type used to represent coordinates.
    type Num: Float;

    /// Latitude in degrees.
    fn lat(&self) -> Self::Num;
    /// Longitude in degrees.
    fn lon(&self) -> Self::Num;

    /// Latitude in radians.
    fn lat_rad(&self) -> Self::Num {
        self.lat().to_radians()
    }

    /// Longitude in radians.
    fn lon_rad(&self) -> Self::Num {
        self.lon().to_radians()
    }

    /// Great-circle distance to the `other` point in meters, computed with the haversine formula on a sphere with
    /// the mean radius of the `datum`.
    ///
    /// Returns `None` if the radius cannot be represented by the numeric type.
    fn distance(&self, other: &impl GeoPoint<Num = Self::Num>, datum: &Datum) -> Option<Self::Num> {
        let radius: Self::Num = NumCast::from(datum.mean_radius())?;
        let two = Self::Num::one() + Self::Num::one();

        let d_lat = (other.lat() - self.lat()).to_radians() / two;
        let d_lon = (other.lon() - self.lon()).to_radians() / two;
        let a = d_lat.sin().powi(2) + self.lat_rad().cos() * other.lat_rad().cos() * d_lon.sin().powi(2);

        Some(two * radius * a.sqrt().min(Self::Num::one()).asin())
    }
}

/// Geo point that can be constructed from latitude and longitude.
pub trait NewGeoPoint<N = f64>: GeoPoint<Num = N> + Sized {
    /// Creates a point from latitude and longitude in degrees.
    fn latlon(lat: N, lon: N) -> Self;

    /// Creates a point from longitude and latitude in degrees.
    fn lonlat(lon: N, lat: N) -> Self {
        Self::latlon(lat, lon)
    }
}

/// 2d point on the surface of a celestial body.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint2d {
    lat: f64,
    lon: f64,
}

impl GeoPoint for GeoPoint2d {
    type Num = f64;

    fn lat(&self) -> f64 {
        self.lat
    }

    fn lon(&self) -> f64 {
        self.lon
    }
}

impl NewGeoPoint<f64> for GeoPoint2d {
    fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl Coordinates for GeoPoint2d {
    fn coordinates(&self) -> (f64, f64, Option<f64>) {
        (self.lon, self.lat, None)
    }

    fn set_coordinates(&mut self, x: f64, y: f64, _z: Option<f64>) {
        self.lon = x;
        self.lat = y;
    }
}

/// Great-circle distance in meters between two longitude/latitude pairs given in degrees, on a sphere with the
/// given radius.
pub fn haversine_distance(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64, radius: f64) -> f64 {
    let a = GeoPoint2d::latlon(lat_a, lon_a);
    let b = GeoPoint2d::latlon(lat_b, lon_b);
    a.distance(&b, &Datum::sphere(radius)).unwrap_or(f64::NAN)
}

/// Creates a new [`GeoPoint2d`] from latitude and longitude values (in degrees).
///
/// ```
/// use projections_types::geo::GeoPoint;
/// use projections_types::latlon;
///
/// let point = latlon!(38.0, 52.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        <::projections_types::geo::GeoPoint2d as ::projections_types::geo::NewGeoPoint<f64>>::latlon(
            $lat, $lon,
        )
    };
}

//! Points in geographic coordinates (latitude and longitude) and great-circle distances between them.

mod datum;
mod point;

pub use datum::Datum;
pub use point::{haversine_distance, GeoPoint, GeoPoint2d, NewGeoPoint};

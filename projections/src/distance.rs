use projections_types::geo::{haversine_distance as great_circle, Datum};
use projections_types::Coordinates;

use crate::error::ProjectionError;
use crate::registry::{builtins, Registry};

/// Great-circle distance in meters between two points given in the coordinate system `crs_id`.
///
/// Both points are transformed to WGS84 longitude/latitude first. The distance is computed on a sphere with the mean
/// radius of the WGS84 ellipsoid, so it is off by up to half a percent compared to the geodesic one.
pub fn haversine_distance(
    registry: &Registry,
    crs_id: &str,
    a: &impl Coordinates,
    b: &impl Coordinates,
) -> Result<f64, ProjectionError> {
    let transformation = registry.transformation(crs_id, builtins::WGS84)?;

    let (x, y, _) = a.coordinates();
    let (lon_a, lat_a) = transformation.transform(x, y)?;
    let (x, y, _) = b.coordinates();
    let (lon_b, lat_b) = transformation.transform(x, y)?;

    Ok(great_circle(lon_a, lat_a, lon_b, lat_b, Datum::WGS84.mean_radius()))
}

impl Registry {
    /// See [`haversine_distance`].
    pub fn haversine_distance(
        &self,
        crs_id: &str,
        a: &impl Coordinates,
        b: &impl Coordinates,
    ) -> Result<f64, ProjectionError> {
        haversine_distance(self, crs_id, a, b)
    }
}

//! Systems and direct transformations every registry knows without loading the reference database.

use crate::transformation::DirectTransform;

pub(crate) const WGS84: &str = "EPSG:4326";
pub(crate) const WEB_MERCATOR: &str = "EPSG:3857";
pub(crate) const PTV_MERCATOR: &str = "PTV_MERCATOR";
pub(crate) const PTV_GEODECIMAL: &str = "PTV_GEODECIMAL";
pub(crate) const PTV_GEOMINSEC: &str = "PTV_GEOMINSEC";

const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;
const PTV_MERCATOR_RADIUS: f64 = 6_371_000.0;
const GEODECIMAL_FACTOR: f64 = 100_000.0;

pub(crate) const SYSTEMS: &[(&str, &str)] = &[
    (WGS84, "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs"),
    (
        WEB_MERCATOR,
        "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs",
    ),
    (
        PTV_MERCATOR,
        "+proj=merc +a=6371000 +b=6371000 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs",
    ),
    (
        PTV_GEODECIMAL,
        "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs +custom=shiftscale:0,0,0.00001,0.00001",
    ),
    (
        PTV_GEOMINSEC,
        "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs +custom=dms:100000",
    ),
];

pub(crate) const ALIASES: &[(&str, &str)] = &[
    ("CRS:84", "@EPSG:4326"),
    ("EPSG:900913", "@EPSG:3857"),
    ("EPSG:3785", "@EPSG:3857"),
    ("EPSG:102100", "@EPSG:3857"),
    ("EPSG:102113", "@EPSG:3857"),
    ("OSGEO:41001", "@EPSG:3857"),
];

/// Direct transformations in one direction. The registry adds the inverse of each as well.
pub(crate) fn direct_transformations() -> [(&'static str, &'static str, DirectTransform); 4] {
    [
        (
            WGS84,
            WEB_MERCATOR,
            DirectTransform::GeographicToMercator {
                radius: WEB_MERCATOR_RADIUS,
            },
        ),
        (
            WGS84,
            PTV_MERCATOR,
            DirectTransform::GeographicToMercator {
                radius: PTV_MERCATOR_RADIUS,
            },
        ),
        (
            WEB_MERCATOR,
            PTV_MERCATOR,
            DirectTransform::Scale {
                factor: PTV_MERCATOR_RADIUS / WEB_MERCATOR_RADIUS,
            },
        ),
        (
            PTV_GEODECIMAL,
            WGS84,
            DirectTransform::Scale {
                factor: 1.0 / GEODECIMAL_FACTOR,
            },
        ),
    ]
}

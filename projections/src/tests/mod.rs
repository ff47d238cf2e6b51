//! Fixtures shared by the unit tests of the crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::{NativeProjection, Proj4Backend, ProjectionBackend};

pub const LONLAT_WGS84: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";
pub const WEB_MERCATOR: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";
pub const UTM_32N: &str = "+proj=utm +zone=32 +datum=WGS84 +units=m +no_defs";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Proj4 backend that counts how often it was asked to do something.
#[derive(Default)]
pub struct CountingBackend {
    inner: Proj4Backend,
    created: AtomicUsize,
    transform_calls: AtomicUsize,
}

impl CountingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn transform_calls(&self) -> usize {
        self.transform_calls.load(Ordering::SeqCst)
    }
}

impl ProjectionBackend for CountingBackend {
    fn create_handle(&self, parameters: &str) -> Option<Box<dyn NativeProjection>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_handle(parameters)
    }

    fn transform_points(
        &self,
        source: &dyn NativeProjection,
        target: &dyn NativeProjection,
        x: &mut [f64],
        y: &mut [f64],
        z: Option<&mut [f64]>,
    ) -> bool {
        self.transform_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.transform_points(source, target, x, y, z)
    }
}

use std::any::Any;
use std::fmt::{Debug, Formatter};

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::backend::{NativeProjection, ProjectionBackend};

/// Backend built on the pure Rust port of PROJ.4.
#[derive(Debug, Default, Clone, Copy)]
pub struct Proj4Backend;

impl Proj4Backend {
    /// Creates a new backend.
    pub fn new() -> Self {
        Self
    }
}

struct Proj4Handle {
    proj: Proj,
    parameters: String,
}

impl Debug for Proj4Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proj4Handle")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl NativeProjection for Proj4Handle {
    fn is_angular(&self) -> bool {
        self.proj.is_latlong()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ProjectionBackend for Proj4Backend {
    fn create_handle(&self, parameters: &str) -> Option<Box<dyn NativeProjection>> {
        match Proj::from_proj_string(parameters) {
            Ok(proj) => Some(Box::new(Proj4Handle {
                proj,
                parameters: parameters.to_string(),
            })),
            Err(err) => {
                log::debug!("Backend rejected parameters '{parameters}': {err:?}");
                None
            }
        }
    }

    fn transform_points(
        &self,
        source: &dyn NativeProjection,
        target: &dyn NativeProjection,
        x: &mut [f64],
        y: &mut [f64],
        mut z: Option<&mut [f64]>,
    ) -> bool {
        let (Some(source), Some(target)) = (
            source.as_any().downcast_ref::<Proj4Handle>(),
            target.as_any().downcast_ref::<Proj4Handle>(),
        ) else {
            log::warn!("Handles passed to the proj4 backend were created by another backend");
            return false;
        };

        if x.len() != y.len() || z.as_ref().is_some_and(|z| z.len() != x.len()) {
            return false;
        }

        for i in 0..x.len() {
            let mut point = (x[i], y[i], z.as_ref().map_or(0.0, |z| z[i]));
            if let Err(err) = transform(&source.proj, &target.proj, &mut point) {
                log::debug!(
                    "Failed to transform point ({}, {}) from '{}' to '{}': {err:?}",
                    x[i],
                    y[i],
                    source.parameters,
                    target.parameters
                );
                return false;
            }

            if !point.0.is_finite() || !point.1.is_finite() {
                return false;
            }

            x[i] = point.0;
            y[i] = point.1;
            if let Some(z) = z.as_mut() {
                z[i] = point.2;
            }
        }

        true
    }
}

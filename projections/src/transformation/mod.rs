//! Transformations of coordinates between two coordinate reference systems.

use std::sync::Arc;

use crate::crs::CoordinateReferenceSystem;
use crate::error::ProjectionError;
use crate::registry::Registry;

mod direct;
mod objects;

pub use direct::DirectTransform;
pub use objects::INITIAL_BUFFER_CAPACITY;

/// Transformation of coordinates from a source to a target [`CoordinateReferenceSystem`].
///
/// A transformation uses a [`DirectTransform`] when the registry knows one for the pair of systems and the backend
/// otherwise. Transforming from a system into the same system leaves the coordinates untouched.
///
/// The source and the target are checked on every call: once either of them is disposed, every call fails with
/// [`ProjectionError::TransformationNotFound`].
#[derive(Debug, Clone)]
pub struct Transformation {
    from: String,
    to: String,
    source: Arc<CoordinateReferenceSystem>,
    target: Arc<CoordinateReferenceSystem>,
    kind: TransformationKind,
}

#[derive(Debug, Clone, Copy)]
enum TransformationKind {
    Direct(DirectTransform),
    General,
}

impl Transformation {
    /// Creates a transformation between two systems of the registry.
    ///
    /// Fails if either identifier is unknown or if the backend cannot create a handle for one of the systems.
    pub fn new(registry: &Registry, from: &str, to: &str) -> Result<Self, ProjectionError> {
        let not_found = || ProjectionError::not_found(from, to);
        let source = registry.get(from).ok_or_else(not_found)?;
        let target = registry.get(to).ok_or_else(not_found)?;

        let mut transformation = Self::between(registry, source, target).map_err(|_| not_found())?;
        transformation.from = from.to_string();
        transformation.to = to.to_string();
        Ok(transformation)
    }

    /// Creates a transformation between two given systems. Aliases are resolved with the registry, which also
    /// provides the direct transformations.
    pub fn between(
        registry: &Registry,
        source: Arc<CoordinateReferenceSystem>,
        target: Arc<CoordinateReferenceSystem>,
    ) -> Result<Self, ProjectionError> {
        let not_found = || ProjectionError::not_found(source.id(), target.id());
        let resolve = |crs: &Arc<CoordinateReferenceSystem>| match crs.alias_for() {
            Some(id) => registry.get(id),
            None => Some(crs.clone()),
        };

        let resolved_source = resolve(&source).ok_or_else(not_found)?;
        let resolved_target = resolve(&target).ok_or_else(not_found)?;

        let kind = if Arc::ptr_eq(&resolved_source, &resolved_target) {
            TransformationKind::Direct(DirectTransform::Identity)
        } else if let Some(direct) = registry.direct(&resolved_source.id(), &resolved_target.id()) {
            TransformationKind::Direct(direct)
        } else {
            TransformationKind::General
        };

        let transformation = Self {
            from: source.id(),
            to: target.id(),
            source: resolved_source,
            target: resolved_target,
            kind,
        };

        if !transformation.is_valid() {
            return Err(not_found());
        }

        log::debug!(
            "Created {} transformation from '{}' to '{}'",
            if transformation.is_direct() { "direct" } else { "general" },
            transformation.from,
            transformation.to
        );

        Ok(transformation)
    }

    /// Identifier the transformation was created from.
    pub fn from_id(&self) -> &str {
        &self.from
    }

    /// Identifier the transformation was created for.
    pub fn to_id(&self) -> &str {
        &self.to
    }

    /// Source system, with aliases resolved.
    pub fn source(&self) -> &Arc<CoordinateReferenceSystem> {
        &self.source
    }

    /// Target system, with aliases resolved.
    pub fn target(&self) -> &Arc<CoordinateReferenceSystem> {
        &self.target
    }

    /// Returns true if the transformation does not use the backend.
    pub fn is_direct(&self) -> bool {
        matches!(self.kind, TransformationKind::Direct(_))
    }

    /// Returns true if the transformation can be used.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            TransformationKind::Direct(DirectTransform::Identity) => self.source.init(),
            TransformationKind::Direct(_) => !self.source.is_disposed() && !self.target.is_disposed(),
            TransformationKind::General => self.source.init() && self.target.init(),
        }
    }

    fn not_found(&self) -> ProjectionError {
        ProjectionError::not_found(&self.from, &self.to)
    }

    fn ensure_valid(&self) -> Result<(), ProjectionError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.not_found())
        }
    }

    /// Transforms a single point.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let (x, y, _) = self.transform_z(x, y, None)?;
        Ok((x, y))
    }

    /// Transforms a single point with an optional height.
    pub fn transform_z(
        &self,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> Result<(f64, f64, Option<f64>), ProjectionError> {
        self.ensure_valid()?;

        let mut xs = [x];
        let mut ys = [y];
        match z {
            Some(z) => {
                let mut zs = [z];
                self.apply(&mut xs, &mut ys, Some(&mut zs[..]))?;
                Ok((xs[0], ys[0], Some(zs[0])))
            }
            None => {
                self.apply(&mut xs, &mut ys, None)?;
                Ok((xs[0], ys[0], None))
            }
        }
    }

    /// Transforms parallel coordinate arrays in place. The arrays are left unchanged if any point fails.
    pub fn transform_in_place(
        &self,
        x: &mut [f64],
        y: &mut [f64],
        z: Option<&mut [f64]>,
    ) -> Result<(), ProjectionError> {
        let length = x.len();
        self.transform_window(x, y, z, 0, length)
    }

    /// Transforms `length` points of parallel coordinate arrays in place, starting at `index`. Points outside the
    /// window are not touched, and nothing is written if the transformation fails.
    pub fn transform_window(
        &self,
        x: &mut [f64],
        y: &mut [f64],
        z: Option<&mut [f64]>,
        index: usize,
        length: usize,
    ) -> Result<(), ProjectionError> {
        self.ensure_valid()?;
        check_lengths(x.len(), y.len(), z.as_ref().map(|z| z.len()))?;

        let end = index
            .checked_add(length)
            .filter(|end| *end <= x.len())
            .ok_or_else(|| {
                ProjectionError::InvalidArgument(format!(
                    "window of {length} points at {index} exceeds array length {}",
                    x.len()
                ))
            })?;

        let mut xs = x[index..end].to_vec();
        let mut ys = y[index..end].to_vec();
        let mut zs = z.as_ref().map(|z| z[index..end].to_vec());
        self.apply(&mut xs, &mut ys, zs.as_deref_mut())?;

        x[index..end].copy_from_slice(&xs);
        y[index..end].copy_from_slice(&ys);
        if let (Some(z), Some(zs)) = (z, zs) {
            z[index..end].copy_from_slice(&zs);
        }

        Ok(())
    }

    /// Transforms parallel coordinate arrays into caller-provided output arrays of the same length.
    ///
    /// Either both or neither of `z_in` and `z_out` must be given.
    pub fn transform_arrays(
        &self,
        x_in: &[f64],
        y_in: &[f64],
        z_in: Option<&[f64]>,
        x_out: &mut [f64],
        y_out: &mut [f64],
        z_out: Option<&mut [f64]>,
    ) -> Result<(), ProjectionError> {
        self.ensure_valid()?;
        check_lengths(x_in.len(), y_in.len(), z_in.map(<[f64]>::len))?;
        check_lengths(x_out.len(), y_out.len(), z_out.as_ref().map(|z| z.len()))?;

        if x_out.len() != x_in.len() {
            return Err(ProjectionError::InvalidArgument(format!(
                "output arrays have {} points, input arrays have {}",
                x_out.len(),
                x_in.len()
            )));
        }

        let z_out = match (z_in, z_out) {
            (Some(z_in), Some(z_out)) => {
                z_out.copy_from_slice(z_in);
                Some(z_out)
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(ProjectionError::InvalidArgument(
                    "input has z coordinates but no output array for them".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ProjectionError::InvalidArgument(
                    "output array for z coordinates given without input z coordinates".to_string(),
                ))
            }
        };

        x_out.copy_from_slice(x_in);
        y_out.copy_from_slice(y_in);
        self.apply(x_out, y_out, z_out)
    }

    /// Transforms the coordinates in place. Arguments must be validated by the caller.
    fn apply(&self, x: &mut [f64], y: &mut [f64], mut z: Option<&mut [f64]>) -> Result<(), ProjectionError> {
        if x.is_empty() {
            return Ok(());
        }

        match self.kind {
            TransformationKind::Direct(DirectTransform::Identity) => Ok(()),
            TransformationKind::Direct(direct) => {
                for (x, y) in x.iter_mut().zip(y.iter_mut()) {
                    let (new_x, new_y) = direct.apply(*x, *y);
                    if !new_x.is_finite() || !new_y.is_finite() {
                        log::debug!("Direct transformation from '{}' to '{}' produced no result", self.from, self.to);
                        return Err(self.not_found());
                    }

                    *x = new_x;
                    *y = new_y;
                }

                Ok(())
            }
            TransformationKind::General => {
                let source = self.source.read_state();
                let target = self.target.read_state();
                let (Some(source_handle), Some(target_handle)) = (&source.handle, &target.handle) else {
                    return Err(self.not_found());
                };

                if let Some(custom) = &source.custom {
                    custom.forward_slices(x, y, z.as_deref_mut());
                }

                let transformed = self.source.backend().transform_points(
                    &**source_handle,
                    &**target_handle,
                    x,
                    y,
                    z.as_deref_mut(),
                );
                if !transformed {
                    log::debug!("Backend failed to transform from '{}' to '{}'", self.from, self.to);
                    return Err(self.not_found());
                }

                if let Some(custom) = &target.custom {
                    custom.inverse_slices(x, y, z);
                }

                Ok(())
            }
        }
    }
}

fn check_lengths(x: usize, y: usize, z: Option<usize>) -> Result<(), ProjectionError> {
    if x != y || z.is_some_and(|z| z != x) {
        return Err(ProjectionError::InvalidArgument(format!(
            "coordinate arrays have different lengths: x {x}, y {y}, z {z:?}"
        )));
    }

    Ok(())
}

impl Registry {
    /// Creates a [`Transformation`] between two systems of the registry.
    pub fn transformation(&self, from: &str, to: &str) -> Result<Transformation, ProjectionError> {
        Transformation::new(self, from, to)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    use super::*;
    use crate::tests::{init_logger, CountingBackend, LONLAT_WGS84, UTM_32N, WEB_MERCATOR};

    const KARLSRUHE: (f64, f64) = (8.4037, 49.0069);
    const KARLSRUHE_MERCATOR: (f64, f64) = (935_495.60, 6_276_032.26);

    fn registry(backend: &Arc<CountingBackend>) -> Registry {
        init_logger();
        Registry::builder().backend(backend.clone()).build()
    }

    #[test]
    fn karlsruhe_to_web_mercator_direct() {
        let backend = CountingBackend::new();
        let registry = registry(&backend);
        let transformation = registry.transformation("EPSG:4326", "EPSG:3857").expect("built-in pair");

        assert!(transformation.is_direct());
        let (x, y) = transformation.transform(KARLSRUHE.0, KARLSRUHE.1).expect("transformed");
        assert_abs_diff_eq!(x, KARLSRUHE_MERCATOR.0, epsilon = 0.01);
        assert_abs_diff_eq!(y, KARLSRUHE_MERCATOR.1, epsilon = 0.01);
        assert_eq!(backend.transform_calls(), 0);
    }

    #[test]
    fn karlsruhe_to_web_mercator_with_backend() {
        let backend = CountingBackend::new();
        let registry = registry(&backend);
        assert!(registry.add_parameters("TEST:LL", LONLAT_WGS84, false, true));
        assert!(registry.add_parameters("TEST:MERC", WEB_MERCATOR, false, true));

        let transformation = registry.transformation("TEST:LL", "TEST:MERC").expect("valid systems");
        assert!(!transformation.is_direct());

        let (x, y) = transformation.transform(KARLSRUHE.0, KARLSRUHE.1).expect("transformed");
        assert_abs_diff_eq!(x, KARLSRUHE_MERCATOR.0, epsilon = 0.01);
        assert_abs_diff_eq!(y, KARLSRUHE_MERCATOR.1, epsilon = 0.01);
        assert_eq!(backend.transform_calls(), 1);
    }

    #[test]
    fn round_trip_through_utm() {
        let registry = Registry::new();
        let forward = registry.transformation("EPSG:4326", "EPSG:32632").expect("reference system");
        let back = registry.transformation("EPSG:32632", "EPSG:4326").expect("reference system");

        let (x, y) = forward.transform(KARLSRUHE.0, KARLSRUHE.1).expect("transformed");
        assert_abs_diff_eq!(x, 456_600.0, epsilon = 1000.0);
        assert_abs_diff_eq!(y, 5_428_700.0, epsilon = 1000.0);

        let (lon, lat) = back.transform(x, y).expect("transformed");
        assert_abs_diff_eq!(lon, KARLSRUHE.0, epsilon = 1e-4);
        assert_abs_diff_eq!(lat, KARLSRUHE.1, epsilon = 1e-4);
    }

    #[test]
    fn alias_uses_direct_transformation() {
        let registry = Registry::new();
        let transformation = registry.transformation("EPSG:4326", "EPSG:900913").expect("alias of 3857");

        assert!(transformation.is_direct());
        assert_eq!(transformation.to_id(), "EPSG:900913");
        assert_eq!(transformation.target().id(), "EPSG:3857");

        let (x, y) = transformation.transform(KARLSRUHE.0, KARLSRUHE.1).expect("transformed");
        assert_abs_diff_eq!(x, KARLSRUHE_MERCATOR.0, epsilon = 0.01);
        assert_abs_diff_eq!(y, KARLSRUHE_MERCATOR.1, epsilon = 0.01);
    }

    #[test]
    fn same_system_is_identity() {
        let backend = CountingBackend::new();
        let registry = registry(&backend);
        let transformation = registry.transformation("EPSG:3857", "OSGEO:41001").expect("alias of 3857");

        assert!(transformation.is_direct());
        assert_eq!(transformation.transform(1.5, -2.5).expect("transformed"), (1.5, -2.5));
        assert_eq!(backend.transform_calls(), 0);
    }

    #[test]
    fn unknown_system_is_not_found() {
        let registry = Registry::new();
        assert_matches!(
            registry.transformation("EPSG:4326", "EPSG:0"),
            Err(ProjectionError::TransformationNotFound { from, to }) if from == "EPSG:4326" && to == "EPSG:0"
        );
    }

    #[test]
    fn broken_parameters_are_not_found() {
        let registry = Registry::new();
        assert!(registry.add_parameters("BROKEN", "+proj=no_such_projection", false, false));

        assert_matches!(
            registry.transformation("EPSG:4326", "BROKEN"),
            Err(ProjectionError::TransformationNotFound { .. })
        );
    }

    #[test]
    fn direct_and_general_paths_agree() {
        let registry = Registry::new();
        let pairs = [
            ("EPSG:4326", "PTV_MERCATOR", (8.4037, 49.0069)),
            ("EPSG:3857", "PTV_MERCATOR", KARLSRUHE_MERCATOR),
            ("PTV_GEODECIMAL", "EPSG:4326", (840_370.0, 4_900_690.0)),
            ("PTV_MERCATOR", "EPSG:4326", (934_448.81, 6_269_009.51)),
        ];

        for (from, to, (x, y)) in pairs {
            let direct = registry.transformation(from, to).expect("built-in pair");
            assert!(direct.is_direct(), "{from} -> {to}");

            let general = Transformation {
                kind: TransformationKind::General,
                ..direct.clone()
            };

            let expected = direct.transform(x, y).expect("direct");
            let actual = general.transform(x, y).expect("general");
            assert_abs_diff_eq!(actual.0, expected.0, epsilon = 1e-3);
            assert_abs_diff_eq!(actual.1, expected.1, epsilon = 1e-3);
        }
    }

    #[test]
    fn geominsec_to_wgs84() {
        let registry = Registry::new();
        let transformation = registry.transformation("PTV_GEOMINSEC", "EPSG:4326").expect("built-in systems");
        assert!(!transformation.is_direct());

        // 8°24'13.32" east, 49°00'24.84" north
        let (lon, lat) = transformation.transform(824_133.2, 4_900_248.4).expect("transformed");
        assert_abs_diff_eq!(lon, 8.4037, epsilon = 1e-6);
        assert_abs_diff_eq!(lat, 49.0069, epsilon = 1e-6);

        let back = registry.transformation("EPSG:4326", "PTV_GEOMINSEC").expect("built-in systems");
        let (x, y) = back.transform(lon, lat).expect("transformed");
        assert_abs_diff_eq!(x, 824_133.2, epsilon = 1e-3);
        assert_abs_diff_eq!(y, 4_900_248.4, epsilon = 1e-3);
    }

    #[test]
    fn arrays_match_single_points() {
        let registry = Registry::new();
        let transformation = registry.transformation("EPSG:4326", "EPSG:32632").expect("reference system");

        for count in [0, 1, 1023, 1024, 1025] {
            let xs: Vec<f64> = (0..count).map(|i| 6.0 + (i % 60) as f64 * 0.1).collect();
            let ys: Vec<f64> = (0..count).map(|i| 45.0 + (i % 90) as f64 * 0.1).collect();

            let mut x_out = vec![0.0; count];
            let mut y_out = vec![0.0; count];
            transformation
                .transform_arrays(&xs, &ys, None, &mut x_out, &mut y_out, None)
                .expect("transformed");

            for i in 0..count {
                let (x, y) = transformation.transform(xs[i], ys[i]).expect("transformed");
                assert_abs_diff_eq!(x_out[i], x, epsilon = 1e-6);
                assert_abs_diff_eq!(y_out[i], y, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn window_leaves_other_points_untouched() {
        let registry = Registry::new();
        let transformation = registry.transformation("EPSG:4326", "EPSG:3857").expect("built-in pair");

        let mut xs = [KARLSRUHE.0; 4];
        let mut ys = [KARLSRUHE.1; 4];
        let mut zs = [100.0; 4];
        transformation
            .transform_window(&mut xs, &mut ys, Some(&mut zs[..]), 1, 2)
            .expect("transformed");

        assert_eq!(xs[0], KARLSRUHE.0);
        assert_eq!(ys[3], KARLSRUHE.1);
        assert_abs_diff_eq!(xs[1], KARLSRUHE_MERCATOR.0, epsilon = 0.01);
        assert_abs_diff_eq!(ys[2], KARLSRUHE_MERCATOR.1, epsilon = 0.01);
        assert_eq!(zs, [100.0; 4]);
    }

    #[test]
    fn failed_in_place_transform_keeps_input() {
        let backend = CountingBackend::new();
        let registry = registry(&backend);
        assert!(registry.add_parameters("TEST:LL", LONLAT_WGS84, false, true));
        assert!(registry.add_parameters("TEST:UTM", UTM_32N, false, true));
        let transformation = registry.transformation("TEST:LL", "TEST:UTM").expect("valid systems");

        let mut xs = [8.0, 9.0, 8.0];
        let mut ys = [49.0, 95.0, 49.0];
        let mut zs = [10.0, 20.0, 30.0];
        assert_matches!(
            transformation.transform_in_place(&mut xs, &mut ys, Some(&mut zs[..])),
            Err(ProjectionError::TransformationNotFound { .. })
        );
        assert_eq!(xs, [8.0, 9.0, 8.0]);
        assert_eq!(ys, [49.0, 95.0, 49.0]);
        assert_eq!(zs, [10.0, 20.0, 30.0]);

        assert_matches!(
            transformation.transform_window(&mut xs, &mut ys, None, 0, 2),
            Err(ProjectionError::TransformationNotFound { .. })
        );
        assert_eq!(xs, [8.0, 9.0, 8.0]);
        assert_eq!(ys, [49.0, 95.0, 49.0]);
        assert_eq!(backend.transform_calls(), 2);
    }

    #[test]
    fn invalid_arguments_do_not_reach_backend() {
        let backend = CountingBackend::new();
        let registry = registry(&backend);
        assert!(registry.add_parameters("TEST:LL", LONLAT_WGS84, false, true));
        assert!(registry.add_parameters("TEST:UTM", UTM_32N, false, true));
        let transformation = registry.transformation("TEST:LL", "TEST:UTM").expect("valid systems");

        let mut xs = [8.0, 9.0, 10.0];
        let mut ys = [49.0, 50.0];
        assert_matches!(
            transformation.transform_in_place(&mut xs, &mut ys, None),
            Err(ProjectionError::InvalidArgument(_))
        );

        let mut ys = [49.0, 50.0, 51.0];
        let mut zs = [0.0];
        assert_matches!(
            transformation.transform_in_place(&mut xs, &mut ys, Some(&mut zs[..])),
            Err(ProjectionError::InvalidArgument(_))
        );
        assert_matches!(
            transformation.transform_window(&mut xs, &mut ys, None, 2, 2),
            Err(ProjectionError::InvalidArgument(_))
        );
        assert_matches!(
            transformation.transform_window(&mut xs, &mut ys, None, usize::MAX, 2),
            Err(ProjectionError::InvalidArgument(_))
        );

        let mut x_out = [0.0; 2];
        let mut y_out = [0.0; 2];
        assert_matches!(
            transformation.transform_arrays(&xs, &ys, None, &mut x_out, &mut y_out, None),
            Err(ProjectionError::InvalidArgument(_))
        );

        let mut x_out = [0.0; 3];
        let mut y_out = [0.0; 3];
        assert_matches!(
            transformation.transform_arrays(&xs, &ys, Some(&[0.0; 3][..]), &mut x_out, &mut y_out, None),
            Err(ProjectionError::InvalidArgument(_))
        );

        assert_eq!(xs, [8.0, 9.0, 10.0]);
        assert_eq!(x_out, [0.0; 3]);
        assert_eq!(backend.transform_calls(), 0);
    }

    #[test]
    fn disposed_registry_invalidates_transformations() {
        let backend = CountingBackend::new();
        let registry = registry(&backend);
        assert!(registry.add_parameters("TEST:LL", LONLAT_WGS84, false, true));
        assert!(registry.add_parameters("TEST:UTM", UTM_32N, false, true));

        let general = registry.transformation("TEST:LL", "TEST:UTM").expect("valid systems");
        let direct = registry.transformation("EPSG:4326", "EPSG:3857").expect("built-in pair");
        assert!(general.is_valid() && direct.is_valid());

        registry.dispose();

        assert!(!general.is_valid());
        assert!(!direct.is_valid());
        assert_matches!(
            general.transform(8.0, 49.0),
            Err(ProjectionError::TransformationNotFound { .. })
        );
        assert_matches!(
            direct.transform(8.0, 49.0),
            Err(ProjectionError::TransformationNotFound { .. })
        );
        assert_eq!(backend.transform_calls(), 0);
    }

    #[test]
    fn replaced_system_drops_direct_transformation() {
        let registry = Registry::new();
        assert!(registry.add_parameters("EPSG:3857", WEB_MERCATOR, true, true));

        let transformation = registry.transformation("EPSG:4326", "EPSG:3857").expect("valid systems");
        assert!(!transformation.is_direct());

        let (x, y) = transformation.transform(KARLSRUHE.0, KARLSRUHE.1).expect("transformed");
        assert_abs_diff_eq!(x, KARLSRUHE_MERCATOR.0, epsilon = 0.01);
        assert_abs_diff_eq!(y, KARLSRUHE_MERCATOR.1, epsilon = 0.01);
    }

    #[test]
    fn height_is_kept() {
        let registry = Registry::new();
        let transformation = registry.transformation("EPSG:4326", "EPSG:3857").expect("built-in pair");

        let (_, _, z) = transformation
            .transform_z(KARLSRUHE.0, KARLSRUHE.1, Some(115.0))
            .expect("transformed");
        assert_eq!(z, Some(115.0));
    }
}

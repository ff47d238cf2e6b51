use projections_types::Coordinates;

use crate::error::ProjectionError;
use crate::transformation::Transformation;

/// Number of points the coordinate buffers of [`Transformation::transform_objects`] are allocated for. The buffers
/// double in size whenever they are full.
pub const INITIAL_BUFFER_CAPACITY: usize = 1024;

struct CoordinateBuffers {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Option<Vec<f64>>,
}

impl CoordinateBuffers {
    fn new() -> Self {
        Self {
            x: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            y: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            z: None,
        }
    }

    fn len(&self) -> usize {
        self.x.len()
    }

    fn push(&mut self, x: f64, y: f64, z: Option<f64>) -> Result<(), ProjectionError> {
        let index = self.len();
        if index == 0 && z.is_some() {
            self.z = Some(Vec::with_capacity(self.x.capacity()));
        }

        if self.z.is_some() != z.is_some() {
            return Err(ProjectionError::InvalidArgument(format!(
                "object {index} {} a z coordinate, unlike the objects before it",
                if z.is_some() { "has" } else { "does not have" }
            )));
        }

        if index == self.x.capacity() {
            self.x.reserve_exact(index);
            self.y.reserve_exact(index);
            if let Some(zs) = &mut self.z {
                zs.reserve_exact(index);
            }
        }

        self.x.push(x);
        self.y.push(y);
        if let (Some(zs), Some(z)) = (&mut self.z, z) {
            zs.push(z);
        }

        Ok(())
    }

    fn get(&self, index: usize) -> (f64, f64, Option<f64>) {
        (
            self.x[index],
            self.y[index],
            self.z.as_ref().map(|zs| zs[index]),
        )
    }
}

impl Transformation {
    /// Transforms the coordinates of arbitrary objects.
    ///
    /// `get` reads the coordinates of an object and `set` writes the transformed ones back. Coordinates of all objects
    /// are collected first and transformed in one batch, nothing is written back if the batch fails. Either all or none
    /// of the objects must have a `z` coordinate.
    pub fn transform_objects<'a, T, I, G, S>(&self, objects: I, get: G, mut set: S) -> Result<(), ProjectionError>
    where
        T: 'a,
        I: IntoIterator<Item = &'a mut T>,
        G: Fn(&T) -> (f64, f64, Option<f64>),
        S: FnMut(&mut T, f64, f64, Option<f64>),
    {
        self.ensure_valid()?;

        let mut buffers = CoordinateBuffers::new();
        let mut targets = vec![];
        for object in objects {
            let (x, y, z) = get(&*object);
            buffers.push(x, y, z)?;
            targets.push(object);
        }

        if targets.is_empty() {
            return Ok(());
        }

        self.apply(&mut buffers.x, &mut buffers.y, buffers.z.as_deref_mut())?;

        for (index, object) in targets.into_iter().enumerate() {
            let (x, y, z) = buffers.get(index);
            set(object, x, y, z);
        }

        Ok(())
    }

    /// Transforms points that implement [`Coordinates`] in place.
    pub fn transform_coordinates<P: Coordinates>(&self, points: &mut [P]) -> Result<(), ProjectionError> {
        self.transform_objects(points.iter_mut(), P::coordinates, |point, x, y, z| {
            point.set_coordinates(x, y, z)
        })
    }
}

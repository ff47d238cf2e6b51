//! Named coordinate reference systems with lazily created backend handles.

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::backend::{NativeProjection, Proj4Backend, ProjectionBackend};
use crate::custom::{CustomTransformation, CUSTOM_KEYWORD};

/// Parameter text starting with this marker redirects to the coordinate system whose identifier follows it.
pub const ALIAS_MARKER: char = '@';

pub(crate) struct CrsState {
    pub(crate) handle: Option<Box<dyn NativeProjection>>,
    pub(crate) custom: Option<CustomTransformation>,
    init_attempted: bool,
    disposed: bool,
}

impl CrsState {
    fn is_valid(&self, is_alias: bool) -> bool {
        !self.disposed && (is_alias || self.handle.is_some() || !self.init_attempted)
    }
}

/// Coordinate reference system: a definition of what numeric coordinates mean.
///
/// A system is defined by PROJ.4 style parameter text and an optional [`CustomTransformation`] chain. The backend
/// handle is created on first use by [`init`](Self::init), at most once, no matter how many threads ask for it. A
/// system whose parameters start with [`ALIAS_MARKER`] is an alias: it never gets a handle and stands for the system
/// it names.
///
/// Systems stored in a [`Registry`](crate::Registry) are disposed by the registry. A system that still holds a handle
/// when dropped releases it and logs a warning.
pub struct CoordinateReferenceSystem {
    id: RwLock<String>,
    parameters: String,
    backend_parameters: String,
    backend: Arc<dyn ProjectionBackend>,
    initialized: AtomicBool,
    state: RwLock<CrsState>,
}

impl CoordinateReferenceSystem {
    /// Creates a coordinate system using the default [`Proj4Backend`].
    ///
    /// See [`parse_with_backend`](Self::parse_with_backend).
    pub fn parse(
        id: Option<&str>,
        parameters: &str,
        custom: Option<CustomTransformation>,
        lazy: bool,
    ) -> Self {
        Self::parse_with_backend(Arc::new(Proj4Backend::new()), id, parameters, custom, lazy)
    }

    /// Creates a coordinate system from parameter text.
    ///
    /// A `+custom=<definition>` directive in the parameters is removed from the text given to the backend and becomes the
    /// innermost node of the `custom` chain. With `lazy == false` the system is initialized immediately.
    pub fn parse_with_backend(
        backend: Arc<dyn ProjectionBackend>,
        id: Option<&str>,
        parameters: &str,
        custom: Option<CustomTransformation>,
        lazy: bool,
    ) -> Self {
        let parameters = parameters.trim().to_string();
        let mut backend_parameters = parameters.clone();
        let directive = if parameters.starts_with(ALIAS_MARKER) {
            None
        } else {
            CustomTransformation::parse(&mut backend_parameters, CUSTOM_KEYWORD, true)
        };

        let custom = match (custom, directive) {
            (Some(mut chain), Some(directive)) => {
                chain.append_innermost(directive);
                Some(chain)
            }
            (chain, directive) => chain.or(directive),
        };

        let crs = Self {
            id: RwLock::new(id.unwrap_or_default().to_string()),
            parameters,
            backend_parameters,
            backend,
            initialized: AtomicBool::new(false),
            state: RwLock::new(CrsState {
                handle: None,
                custom,
                init_attempted: false,
                disposed: false,
            }),
        };

        if !lazy {
            crs.init();
        }

        crs
    }

    /// Creates a system without parameters. It stays valid until something tries to initialize it.
    pub fn empty() -> Self {
        Self::parse(None, "", None, true)
    }

    /// Identifier of the system. Empty until the system is stored in a registry or given one at parse time.
    pub fn id(&self) -> String {
        self.id.read().clone()
    }

    pub(crate) fn set_id(&self, id: &str) {
        *self.id.write() = id.to_string();
    }

    /// Parameter text as given at parse time, including a custom directive if there was one.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Parameter text passed to the backend.
    pub fn backend_parameters(&self) -> &str {
        &self.backend_parameters
    }

    pub(crate) fn backend(&self) -> &Arc<dyn ProjectionBackend> {
        &self.backend
    }

    /// Returns true if the system redirects to another identifier.
    pub fn is_alias(&self) -> bool {
        self.parameters.starts_with(ALIAS_MARKER)
    }

    /// Identifier this alias redirects to.
    pub fn alias_for(&self) -> Option<&str> {
        self.parameters.strip_prefix(ALIAS_MARKER).map(str::trim)
    }

    /// Creates the backend handle if it was not created yet and returns [`is_valid`](Self::is_valid).
    ///
    /// For latitude/longitude systems a degree to radian conversion is appended to the custom chain, since the
    /// backend works with radians. Failures of the backend are not reported, the system just becomes invalid.
    pub fn init(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return self.is_valid();
        }

        let mut state = self.state.write();
        if !self.initialized.load(Ordering::Acquire) {
            if !state.disposed && !self.is_alias() {
                if !self.backend_parameters.is_empty() {
                    state.handle = self.backend.create_handle(&self.backend_parameters);
                }

                match &state.handle {
                    Some(handle) if handle.is_angular() => {
                        let radians = CustomTransformation::degrees_to_radians();
                        match &mut state.custom {
                            Some(chain) => chain.append_innermost(radians),
                            None => state.custom = Some(radians),
                        }
                    }
                    Some(_) => {}
                    None => log::debug!(
                        "Failed to create backend handle for coordinate system '{}' ({})",
                        self.id(),
                        self.backend_parameters
                    ),
                }

                state.init_attempted = true;
            }

            self.initialized.store(true, Ordering::Release);
        }

        state.is_valid(self.is_alias())
    }

    /// Returns true if the system is usable.
    ///
    /// A system is valid when it is not disposed and either has a handle or was never initialized. Validity of an
    /// alias is decided by its target.
    pub fn is_valid(&self) -> bool {
        self.state.read_recursive().is_valid(self.is_alias())
    }

    /// Returns true after [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.state.read_recursive().disposed
    }

    /// Returns true if the backend reports a latitude/longitude system. False before initialization.
    pub fn is_angular(&self) -> bool {
        self.state
            .read_recursive()
            .handle
            .as_ref()
            .is_some_and(|handle| handle.is_angular())
    }

    /// Custom chain of the system. Includes the degree to radian conversion once an angular system is initialized.
    pub fn custom_transformation(&self) -> Option<CustomTransformation> {
        self.state.read_recursive().custom.clone()
    }

    /// Releases the backend handle. The system stays invalid afterwards. Calling it more than once does nothing.
    pub fn dispose(&self) {
        let mut state = self.state.write();
        if state.disposed {
            return;
        }

        state.disposed = true;
        if state.handle.take().is_some() {
            log::debug!("Released backend handle of coordinate system '{}'", self.id());
        }
    }

    /// Line of the bulk text format: `id;parameters`.
    pub fn to_record(&self) -> String {
        format!("{};{}", self.id(), self.parameters)
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, CrsState> {
        self.state.read_recursive()
    }
}

impl Debug for CoordinateReferenceSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateReferenceSystem")
            .field("id", &*self.id.read())
            .field("parameters", &self.parameters)
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Drop for CoordinateReferenceSystem {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.handle.take().is_some() {
            log::warn!(
                "Coordinate system '{}' was dropped without being disposed",
                self.id.get_mut()
            );
        }
    }
}

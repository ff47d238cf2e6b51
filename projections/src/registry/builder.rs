use std::sync::Arc;

use crate::backend::{Proj4Backend, ProjectionBackend};
use crate::registry::Registry;

/// Configuration of a new [`Registry`].
///
/// ```no_run
/// use projections::Registry;
///
/// let registry = Registry::builder()
///     .with_reference_database(false)
///     .with_content("LOCAL;+proj=utm +zone=32 +datum=WGS84")
///     .build();
/// assert!(registry.contains("local"));
/// ```
pub struct RegistryBuilder {
    backend: Option<Arc<dyn ProjectionBackend>>,
    with_builtins: bool,
    with_database: bool,
    content: Vec<String>,
}

impl RegistryBuilder {
    /// Creates a builder with the [`Proj4Backend`], the built-in systems and the reference database enabled.
    pub fn new() -> Self {
        Self {
            backend: None,
            with_builtins: true,
            with_database: true,
            content: vec![],
        }
    }

    /// Sets the backend used to create the handles of all the systems of the registry.
    pub fn backend(mut self, backend: Arc<dyn ProjectionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Whether the hand-registered systems (WGS84, web mercator and friends) and their direct transformations are
    /// available.
    pub fn with_builtins(mut self, enabled: bool) -> Self {
        self.with_builtins = enabled;
        self
    }

    /// Whether the bundled reference database is loaded when a lookup misses.
    pub fn with_reference_database(mut self, enabled: bool) -> Self {
        self.with_database = enabled;
        self
    }

    /// Adds bulk text (`id;parameters` lines) to store in the registry once it is built.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content.push(content.into());
        self
    }

    /// Creates the registry.
    pub fn build(self) -> Registry {
        let backend = self.backend.unwrap_or_else(|| Arc::new(Proj4Backend::new()));
        let registry = Registry::from_builder(backend, self.with_builtins, self.with_database);
        for content in &self.content {
            let count = registry.set_content(content);
            log::debug!("Stored {count} coordinate systems from builder content");
        }

        registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

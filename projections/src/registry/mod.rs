//! Catalog of coordinate reference systems keyed by case-insensitive identifiers.

use std::sync::{Arc, OnceLock};

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::backend::ProjectionBackend;
use crate::crs::{CoordinateReferenceSystem, ALIAS_MARKER};
use crate::transformation::DirectTransform;

mod builder;
pub(crate) mod builtins;
mod database;

pub use builder::RegistryBuilder;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Thread-safe catalog of [`CoordinateReferenceSystem`]s.
///
/// Identifiers are case-insensitive. An entry can be an alias of another identifier; lookups follow alias chains and
/// give up on cycles. The registry starts with a handful of hand-registered systems and loads the bundled reference
/// database the first time a lookup misses.
///
/// Coordinate systems are initialized outside of the registry lock, so a slow backend never blocks lookups of other
/// threads. Dropping a registry disposes all the systems it holds.
pub struct Registry {
    backend: Arc<dyn ProjectionBackend>,
    with_builtins: bool,
    with_database: bool,
    state: Mutex<RegistryState>,
    direct: RwLock<AHashMap<(String, String), DirectTransform>>,
}

#[derive(Default)]
struct RegistryState {
    table: AHashMap<String, Arc<CoordinateReferenceSystem>>,
    builtins_loaded: bool,
    database_loaded: bool,
}

impl RegistryState {
    fn resolve(&self, id: &str) -> Option<Arc<CoordinateReferenceSystem>> {
        let mut key = id.trim().to_lowercase();
        let mut visited = AHashSet::new();
        loop {
            if !visited.insert(key.clone()) {
                log::warn!("Alias cycle detected while resolving '{id}'");
                return None;
            }

            let crs = self.table.get(&key)?;
            match crs.alias_for() {
                Some(target) => key = target.to_lowercase(),
                None => return Some(crs.clone()),
            }
        }
    }

    fn store(
        &mut self,
        backend: &Arc<dyn ProjectionBackend>,
        id: &str,
        parameters: &str,
        replace: bool,
        replaced: &mut Vec<Arc<CoordinateReferenceSystem>>,
    ) -> bool {
        let key = id.to_lowercase();
        if !replace && self.table.contains_key(&key) {
            return false;
        }

        let crs = CoordinateReferenceSystem::parse_with_backend(backend.clone(), Some(id), parameters, None, true);
        if let Some(old) = self.table.insert(key, Arc::new(crs)) {
            replaced.push(old);
        }

        true
    }

    /// Stores the records of bulk text, aliases after everything else, so that aliases may refer to systems defined
    /// further down the text.
    fn merge(
        &mut self,
        backend: &Arc<dyn ProjectionBackend>,
        text: &str,
        replace: bool,
        replaced: &mut Vec<Arc<CoordinateReferenceSystem>>,
    ) -> usize {
        let mut count = 0;
        let mut aliases = vec![];
        for (id, parameters) in database::records(text) {
            if parameters.starts_with(ALIAS_MARKER) {
                aliases.push((id, parameters));
            } else if self.store(backend, id, parameters, replace, replaced) {
                count += 1;
            }
        }

        loop {
            let pending = aliases.len();
            aliases.retain(|&(id, parameters)| {
                let target = parameters[ALIAS_MARKER.len_utf8()..].trim();
                if target.eq_ignore_ascii_case(id) || self.resolve(target).is_none() {
                    return true;
                }

                if self.store(backend, id, parameters, replace, replaced) {
                    count += 1;
                }
                false
            });

            if aliases.len() == pending {
                break;
            }
        }

        for (id, parameters) in aliases {
            log::warn!("Alias '{id}' refers to an unknown coordinate system ({parameters})");
        }

        count
    }
}

impl Registry {
    /// Creates a registry with the default settings of [`RegistryBuilder`].
    pub fn new() -> Self {
        RegistryBuilder::new().build()
    }

    /// Returns a builder to configure a new registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Default registry shared by the whole process. Created on first access.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            log::debug!("Initializing global coordinate system registry");
            Self::new()
        })
    }

    pub(crate) fn from_builder(
        backend: Arc<dyn ProjectionBackend>,
        with_builtins: bool,
        with_database: bool,
    ) -> Self {
        let registry = Self {
            backend,
            with_builtins,
            with_database,
            state: Mutex::new(RegistryState::default()),
            direct: RwLock::new(AHashMap::new()),
        };

        if with_builtins {
            for (from, to, transform) in builtins::direct_transformations() {
                registry.add_direct(from, to, transform);
            }
        }

        registry
    }

    /// Backend used by the systems created by this registry.
    pub fn backend(&self) -> &Arc<dyn ProjectionBackend> {
        &self.backend
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        let mut state = self.state.lock();
        if !state.builtins_loaded {
            state.builtins_loaded = true;
            if self.with_builtins {
                let mut replaced = vec![];
                for (id, parameters) in builtins::SYSTEMS.iter().chain(builtins::ALIASES) {
                    state.store(&self.backend, id, parameters, false, &mut replaced);
                }
                log::debug!("Registered {} built-in coordinate systems", state.table.len());
            }
        }

        state
    }

    fn load_database(&self, state: &mut RegistryState) -> bool {
        if state.database_loaded {
            return false;
        }

        state.database_loaded = true;
        if !self.with_database {
            return false;
        }

        let mut replaced = vec![];
        let count = state.merge(&self.backend, &database::reference_database(), false, &mut replaced);
        log::debug!("Loaded {count} coordinate systems from the reference database");
        true
    }

    /// Looks up a coordinate system, following aliases.
    ///
    /// Returns `None` for unknown identifiers, broken alias chains and alias cycles. The system is returned as is,
    /// call [`CoordinateReferenceSystem::init`] to find out whether it can be used.
    pub fn get(&self, id: &str) -> Option<Arc<CoordinateReferenceSystem>> {
        let mut state = self.lock();
        if let Some(crs) = state.resolve(id) {
            return Some(crs);
        }

        if self.load_database(&mut state) {
            state.resolve(id)
        } else {
            None
        }
    }

    /// Returns true if [`get`](Self::get) finds a system for the identifier.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Parses the parameter text with the backend of the registry and [adds](Self::add) the result.
    pub fn add_parameters(&self, id: &str, parameters: &str, allow_replace: bool, must_be_valid: bool) -> bool {
        let crs = CoordinateReferenceSystem::parse_with_backend(self.backend.clone(), Some(id), parameters, None, true);
        self.add(id, crs, allow_replace, must_be_valid)
    }

    /// Stores a coordinate system under the identifier.
    ///
    /// Returns false and leaves the registry unchanged if the identifier is empty, if it is taken and `allow_replace`
    /// is not set, if `must_be_valid` is set and the system cannot be initialized, if the system is an alias of an
    /// identifier the registry does not know, or if the same system is already stored under another identifier. A
    /// replaced system is disposed.
    pub fn add(
        &self,
        id: &str,
        crs: impl Into<Arc<CoordinateReferenceSystem>>,
        allow_replace: bool,
        must_be_valid: bool,
    ) -> bool {
        let crs = crs.into();
        let id = id.trim();
        let reject = |reason: &str| {
            log::warn!("Coordinate system '{id}' is not registered: {reason}");
            if Arc::strong_count(&crs) == 1 {
                crs.dispose();
            }
            false
        };

        if id.is_empty() {
            return reject("empty identifier");
        }

        let key = id.to_lowercase();
        match crs.alias_for() {
            Some(target) if target.eq_ignore_ascii_case(id) => return reject("alias of itself"),
            Some(_) => {}
            None if must_be_valid && !crs.init() => return reject("invalid parameters"),
            None => {}
        }

        let replaced = {
            let mut state = self.lock();
            if !allow_replace && state.table.contains_key(&key) {
                drop(state);
                return reject("identifier is already registered");
            }

            if state
                .table
                .iter()
                .any(|(other, stored)| *other != key && Arc::ptr_eq(stored, &crs))
            {
                drop(state);
                return reject("system is already registered under another identifier");
            }

            if let Some(target) = crs.alias_for() {
                let known = state.resolve(target).is_some()
                    || (self.load_database(&mut state) && state.resolve(target).is_some());
                if !known {
                    drop(state);
                    return reject("alias target is unknown");
                }
            }

            crs.set_id(id);
            state.table.insert(key.clone(), crs.clone())
        };

        if let Some(old) = replaced {
            if !Arc::ptr_eq(&old, &crs) {
                old.dispose();
                self.forget_direct(&key);
            }
        }

        true
    }

    /// Removes the entry with the identifier (aliases are not followed) and disposes it.
    pub fn remove(&self, id: &str) -> bool {
        let key = id.trim().to_lowercase();
        let Some(removed) = self.lock().table.remove(&key) else {
            return false;
        };

        removed.dispose();
        self.forget_direct(&key);
        true
    }

    /// Identifiers of all known systems, including the reference database, sorted case-insensitively.
    pub fn ids(&self) -> Vec<String> {
        let mut state = self.lock();
        self.load_database(&mut state);

        let mut keys: Vec<_> = state.table.iter().collect();
        keys.sort_by(|a, b| a.0.cmp(b.0));
        keys.into_iter().map(|(_, crs)| crs.id()).collect()
    }

    /// All known systems in the bulk text format, one `id;parameters` line per system, sorted by identifier.
    pub fn content(&self) -> String {
        let mut state = self.lock();
        self.load_database(&mut state);

        let mut entries: Vec<_> = state.table.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(_, crs)| format!("{}\n", crs.to_record()))
            .collect()
    }

    /// Adds all records of bulk text, replacing existing entries. Aliases are added after all other records, so they
    /// may refer to systems defined later in the text. Records are not validated.
    ///
    /// Returns the number of stored records.
    pub fn set_content(&self, text: &str) -> usize {
        let mut replaced = vec![];
        let count = self.lock().merge(&self.backend, text, true, &mut replaced);

        for old in replaced {
            let key = old.id().to_lowercase();
            old.dispose();
            self.forget_direct(&key);
        }

        count
    }

    /// Disposes every system and empties the registry. Built-in systems and the reference database are loaded
    /// again on the next access.
    pub fn dispose(&self) {
        let removed: Vec<_> = {
            let mut state = self.state.lock();
            state.builtins_loaded = false;
            state.database_loaded = false;
            state.table.drain().map(|(_, crs)| crs).collect()
        };

        log::debug!("Disposing {} coordinate systems", removed.len());
        for crs in removed {
            crs.dispose();
        }
    }

    /// Registers a hand-coded transformation between two identifiers, used instead of the backend. The inverse
    /// direction is registered as well.
    pub fn add_direct(&self, from: &str, to: &str, transform: DirectTransform) {
        let from = from.trim().to_lowercase();
        let to = to.trim().to_lowercase();

        let mut direct = self.direct.write();
        direct.insert((to.clone(), from.clone()), transform.inverse());
        direct.insert((from, to), transform);
    }

    pub(crate) fn direct(&self, from: &str, to: &str) -> Option<DirectTransform> {
        self.direct
            .read()
            .get(&(from.to_lowercase(), to.to_lowercase()))
            .copied()
    }

    fn forget_direct(&self, key: &str) {
        self.direct.write().retain(|(from, to), _| from != key && to != key);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.dispose();
    }
}

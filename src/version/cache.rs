use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::version::error::RegistryError;
use crate::version::registry::{LatestVersion, Registry, RegistryCoordinates};

/// Process-wide memo of latest versions keyed by full coordinates.
///
/// Entries are never invalidated within a run; published version sets only grow.
#[derive(Default)]
pub struct VersionCache {
    entries: Mutex<HashMap<RegistryCoordinates, LatestVersion>>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<RegistryCoordinates, LatestVersion>> {
        // A panicked writer leaves at worst a missing entry
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, coordinates: &RegistryCoordinates) -> Option<LatestVersion> {
        self.lock_entries().get(coordinates).cloned()
    }

    pub fn insert(&self, coordinates: RegistryCoordinates, latest: LatestVersion) {
        self.lock_entries().insert(coordinates, latest);
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-through cache in front of another registry.
///
/// Only successful lookups are stored. Concurrent misses on the same key each
/// hit the inner registry and store equal values.
pub struct CachedRegistry<R> {
    inner: R,
    cache: VersionCache,
}

impl<R: Registry> CachedRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: VersionCache::new(),
        }
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }
}

impl<R: Registry> Registry for CachedRegistry<R> {
    fn latest_version(
        &self,
        coordinates: &RegistryCoordinates,
    ) -> Result<LatestVersion, RegistryError> {
        if let Some(hit) = self.cache.get(coordinates) {
            debug!("Cache hit for {}: {}", coordinates, hit.version);
            return Ok(hit);
        }

        let latest = self.inner.latest_version(coordinates)?;
        self.cache.insert(coordinates.clone(), latest.clone());
        Ok(latest)
    }
}

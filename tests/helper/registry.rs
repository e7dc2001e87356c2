//! Registry test utilities

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tf_bounce::bounce::Transformer;
use tf_bounce::version::error::RegistryError;
use tf_bounce::version::registry::{LatestVersion, Registry, RegistryCoordinates};
use tf_bounce::version::semver::find_latest;

/// Stub registry keyed by `namespace/name/provider`
#[derive(Default)]
pub struct StubRegistry {
    versions: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, module: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            module.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Answer lookups for `module` with a transient failure
    pub fn with_failure(mut self, module: &str) -> Self {
        self.failing.insert(module.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Registry for StubRegistry {
    fn latest_version(
        &self,
        coordinates: &RegistryCoordinates,
    ) -> Result<LatestVersion, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = coordinates.path();

        if self.failing.contains(&key) {
            return Err(RegistryError::InvalidResponse("stub failure".to_string()));
        }

        let versions = self
            .versions
            .get(&key)
            .ok_or_else(|| RegistryError::NotFound(coordinates.to_string()))?;

        match find_latest(versions.iter().map(String::as_str))? {
            Some((raw, parsed)) => Ok(LatestVersion::new(raw, parsed.major)),
            None => Err(RegistryError::NotFound(coordinates.to_string())),
        }
    }
}

/// Hands a stub to a decorator while the test keeps a handle on it
pub struct SharedRegistry(pub Arc<StubRegistry>);

impl Registry for SharedRegistry {
    fn latest_version(
        &self,
        coordinates: &RegistryCoordinates,
    ) -> Result<LatestVersion, RegistryError> {
        self.0.latest_version(coordinates)
    }
}

/// Transformer backed by the given stub
pub fn create_test_transformer(registry: Arc<StubRegistry>) -> Transformer {
    Transformer::new(registry)
}

/// Write `content` to `relative` under `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) -> std::path::PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

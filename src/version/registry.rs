//! Registry trait for resolving the latest published version of a module

use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::config::{RegistryConfig, normalize_host};
use crate::version::error::RegistryError;

/// Catalog address of a published module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryCoordinates {
    /// Normalized host (no scheme, no trailing slash)
    pub host: String,
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

impl RegistryCoordinates {
    pub fn new(host: &str, namespace: &str, name: &str, provider: &str) -> Self {
        Self {
            host: normalize_host(host),
            namespace: namespace.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
        }
    }

    /// Parse a published base (`ns/name/provider` or `host/ns/name/provider`).
    ///
    /// The sub-path must already be split off; three segments resolve against
    /// `default_host`.
    pub fn from_base(base: &str, default_host: &str) -> Result<Self, RegistryError> {
        let segments: Vec<&str> = base.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RegistryError::InvalidSource(base.to_string()));
        }

        match segments.as_slice() {
            [namespace, name, provider] => {
                Ok(Self::new(default_host, namespace, name, provider))
            }
            [host, namespace, name, provider] => Ok(Self::new(host, namespace, name, provider)),
            _ => Err(RegistryError::InvalidSource(base.to_string())),
        }
    }

    /// Coordinates of this project's own module under the given configuration
    pub fn for_module(config: &RegistryConfig, name: &str, provider: &str) -> Self {
        Self::new(&config.host(), config.publisher(), name, provider)
    }

    /// Registry-relative path `namespace/name/provider`
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.name, self.provider)
    }
}

impl fmt::Display for RegistryCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.path())
    }
}

/// Highest published version together with its major component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestVersion {
    pub version: String,
    pub major: u64,
}

impl LatestVersion {
    pub fn new(version: &str, major: u64) -> Self {
        Self {
            version: version.to_string(),
            major,
        }
    }
}

/// Resolves the latest published version of a module.
///
/// Calls block; drivers choose their own concurrency around them.
#[cfg_attr(test, automock)]
pub trait Registry: Send + Sync {
    /// Fetches the latest version for the coordinates
    ///
    /// # Returns
    /// * `Ok(LatestVersion)` - Highest published version
    /// * `Err(RegistryError::NotFound)` - Module is not (yet) published
    /// * `Err(_)` - Any other failure
    fn latest_version(
        &self,
        coordinates: &RegistryCoordinates,
    ) -> Result<LatestVersion, RegistryError>;
}

use serde::Deserialize;
use std::path::Path;

use crate::error::BounceError;

// =============================================================================
// Defaults
// =============================================================================

/// Public Terraform registry host
pub const DEFAULT_REGISTRY_HOST: &str = "registry.terraform.io";

/// File name scanned for module declarations
pub const DEFAULT_FILE_NAME: &str = "main.tf";

/// Number of files processed concurrently by the batch driver
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Timeout for registry requests in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Config file looked up in the working root when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = ".tf-bounce.json";

/// Catalog path of the public registry protocol
const PUBLIC_API_PATH: &str = "/v1/modules";

/// Catalog path of Terraform Cloud / Enterprise private registries
const PRIVATE_API_PATH: &str = "/api/registry/v1/modules";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BounceConfig {
    pub registry: RegistryConfig,
    pub file_name: String,
    pub concurrency: usize,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl BounceConfig {
    /// Reads a JSON config file
    pub fn load(path: &Path) -> Result<Self, BounceError> {
        let content = std::fs::read_to_string(path).map_err(|source| BounceError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| BounceError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Fails when a required setting is missing
    pub fn validate(&self) -> Result<(), BounceError> {
        if self.registry.namespace.trim().is_empty() {
            return Err(BounceError::MissingNamespace);
        }
        if self.concurrency == 0 {
            return Err(BounceError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where published modules live and who publishes them
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry namespace owning this project's modules
    pub namespace: String,
    /// Registry host; empty means the public registry
    pub host: String,
    /// Terraform Cloud organization; selects the private registry layout
    pub organization: Option<String>,
}

impl RegistryConfig {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            ..Self::default()
        }
    }

    /// Normalized host, defaulting to the public registry
    pub fn host(&self) -> String {
        normalize_host(&self.host)
    }

    pub fn is_default_host(&self) -> bool {
        self.host() == DEFAULT_REGISTRY_HOST
    }

    pub fn is_private(&self) -> bool {
        self.organization
            .as_deref()
            .is_some_and(|org| !org.trim().is_empty())
    }

    /// Namespace segment written into published sources
    pub fn publisher(&self) -> &str {
        match &self.organization {
            Some(org) if !org.trim().is_empty() => org.trim(),
            _ => self.namespace.trim(),
        }
    }

    /// Catalog path prefix for version listings
    pub fn api_path(&self) -> &'static str {
        if self.is_private() {
            PRIVATE_API_PATH
        } else {
            PUBLIC_API_PATH
        }
    }

    /// Source prefixes identifying modules published by this configuration.
    ///
    /// Both the bare `namespace/` form and the host-qualified form are accepted
    /// so explicitly prefixed public sources are recognized as well.
    pub fn published_prefixes(&self) -> Vec<String> {
        let publisher = self.publisher();
        let qualified = format!("{}/{}/", self.host(), publisher);
        if self.is_default_host() {
            vec![format!("{}/", publisher), qualified]
        } else {
            vec![qualified]
        }
    }

    /// Environment variable holding the token for this host
    pub fn token_env_var(&self) -> String {
        token_env_var(&self.host())
    }
}

/// Strips scheme and trailing slashes from a host, defaulting to the public registry
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    let host = host.trim_end_matches('/');
    if host.is_empty() {
        DEFAULT_REGISTRY_HOST.to_string()
    } else {
        host.to_string()
    }
}

/// Terraform CLI naming: `TF_TOKEN_` + host with `.` as `_` and `-` as `__`
pub fn token_env_var(host: &str) -> String {
    let mangled = host.replace('-', "__").replace('.', "_");
    format!("TF_TOKEN_{}", mangled)
}

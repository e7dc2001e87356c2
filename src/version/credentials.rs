//! Token lookup for authenticated registry hosts
//!
//! Follows the Terraform CLI conventions: a `TF_TOKEN_<host>` environment
//! variable first, then `~/.terraform.d/credentials.tfrc.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::token_env_var;

/// Source of bearer tokens keyed by registry host
pub trait CredentialSource: Send + Sync {
    fn token(&self, host: &str) -> Option<String>;
}

/// Reads `TF_TOKEN_<host>` style environment variables
pub struct EnvCredentials {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Uses a custom variable lookup instead of the process environment
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvCredentials {
    fn token(&self, host: &str) -> Option<String> {
        let name = token_env_var(host);
        let token = (self.lookup)(&name).filter(|t| !t.trim().is_empty());
        if token.is_some() {
            debug!("Using token from {}", name);
        }
        token
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFileContent {
    #[serde(default)]
    credentials: HashMap<String, HostCredentials>,
}

#[derive(Debug, Deserialize)]
struct HostCredentials {
    token: String,
}

/// Terraform CLI `credentials.tfrc.json`
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// `~/.terraform.d/credentials.tfrc.json`, if a home directory exists
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(&home.join(".terraform.d/credentials.tfrc.json")))
    }
}

impl CredentialSource for CredentialsFile {
    fn token(&self, host: &str) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let parsed: CredentialsFileContent = serde_json::from_str(&content)
            .inspect_err(|e| warn!("Failed to parse {}: {}", self.path.display(), e))
            .ok()?;
        parsed.credentials.get(host).map(|c| c.token.clone())
    }
}

/// Tries each source in order
pub struct ChainedCredentials {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl ChainedCredentials {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }
}

impl CredentialSource for ChainedCredentials {
    fn token(&self, host: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.token(host))
    }
}

/// Environment first, then the Terraform CLI credentials file
pub fn default_credentials() -> ChainedCredentials {
    let mut sources: Vec<Box<dyn CredentialSource>> = vec![Box::new(EnvCredentials::new())];
    if let Some(file) = CredentialsFile::default_location() {
        sources.push(Box::new(file));
    }
    ChainedCredentials::new(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixed(Option<&'static str>);

    impl CredentialSource for Fixed {
        fn token(&self, _host: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn env_credentials_reads_mangled_variable_name() {
        let creds = EnvCredentials::with_lookup(|name| {
            (name == "TF_TOKEN_app_terraform_io").then(|| "secret".to_string())
        });
        assert_eq!(creds.token("app.terraform.io"), Some("secret".to_string()));
        assert_eq!(creds.token("other.example.com"), None);
    }

    #[test]
    fn env_credentials_ignores_blank_tokens() {
        let creds = EnvCredentials::with_lookup(|_| Some("  ".to_string()));
        assert_eq!(creds.token("app.terraform.io"), None);
    }

    #[test]
    fn credentials_file_returns_token_for_host() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.tfrc.json");
        std::fs::write(
            &path,
            r#"{"credentials": {"app.terraform.io": {"token": "from-file"}}}"#,
        )
        .unwrap();

        let creds = CredentialsFile::new(&path);
        assert_eq!(
            creds.token("app.terraform.io"),
            Some("from-file".to_string())
        );
        assert_eq!(creds.token("registry.terraform.io"), None);
    }

    #[test]
    fn credentials_file_missing_or_invalid_yields_none() {
        let dir = TempDir::new().unwrap();
        let missing = CredentialsFile::new(&dir.path().join("absent.json"));
        assert_eq!(missing.token("app.terraform.io"), None);

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert_eq!(CredentialsFile::new(&path).token("app.terraform.io"), None);
    }

    #[test]
    fn chained_credentials_prefers_first_source() {
        let chain = ChainedCredentials::new(vec![
            Box::new(Fixed(None)),
            Box::new(Fixed(Some("second"))),
            Box::new(Fixed(Some("third"))),
        ]);
        assert_eq!(chain.token("any"), Some("second".to_string()));
    }
}

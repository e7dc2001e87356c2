//! Terraform module registry protocol implementation

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DEFAULT_REGISTRY_HOST, FETCH_TIMEOUT_MS, RegistryConfig};
use crate::version::credentials::CredentialSource;
use crate::version::error::RegistryError;
use crate::version::registry::{LatestVersion, Registry, RegistryCoordinates};
use crate::version::semver::find_latest;

/// Response from `GET <api>/<namespace>/<name>/<provider>/versions`
#[derive(Debug, Deserialize)]
struct VersionsResponse {
    modules: Vec<ModuleVersions>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersions {
    #[serde(default)]
    versions: Vec<ModuleVersion>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersion {
    version: String,
}

/// Registry implementation for the Terraform module registry API
pub struct TerraformRegistry {
    client: reqwest::blocking::Client,
    api_path: String,
    /// Replaces `https://<host>` for every request (tests, mirrors)
    endpoint: Option<String>,
    credentials: Arc<dyn CredentialSource>,
}

impl TerraformRegistry {
    /// Creates a registry client using the given catalog path
    pub fn new(
        api_path: &str,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, RegistryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tf-bounce/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self {
            client,
            api_path: api_path.trim_end_matches('/').to_string(),
            endpoint: None,
            credentials,
        })
    }

    /// Creates a registry client matching the configured registry layout
    pub fn from_config(
        config: &RegistryConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, RegistryError> {
        Self::new(config.api_path(), credentials)
    }

    /// Sends every request to `endpoint` instead of the coordinates' host
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    fn catalog_url(&self, coordinates: &RegistryCoordinates) -> String {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}", coordinates.host),
        };
        format!("{}{}/{}/versions", base, self.api_path, coordinates.path())
    }
}

impl Registry for TerraformRegistry {
    fn latest_version(
        &self,
        coordinates: &RegistryCoordinates,
    ) -> Result<LatestVersion, RegistryError> {
        let url = self.catalog_url(coordinates);
        debug!("Fetching versions from {}", url);

        let mut request = self.client.get(&url).header("Accept", "application/json");

        if coordinates.host != DEFAULT_REGISTRY_HOST {
            if let Some(token) = self.credentials.token(&coordinates.host) {
                request = request.bearer_auth(token);
            } else {
                debug!("No token available for {}", coordinates.host);
            }
        }

        let response = request.send()?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(coordinates.to_string()));
        }

        if !status.is_success() {
            warn!("Registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body: VersionsResponse = response.json().map_err(|e| {
            warn!("Failed to parse registry response from {}: {}", url, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let versions = body
            .modules
            .iter()
            .flat_map(|m| m.versions.iter().map(|v| v.version.as_str()));

        match find_latest(versions)? {
            Some((raw, parsed)) => Ok(LatestVersion::new(raw, parsed.major)),
            None => Err(RegistryError::NotFound(coordinates.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::credentials::EnvCredentials;
    use mockito::{Matcher, Server};

    fn no_credentials() -> Arc<dyn CredentialSource> {
        Arc::new(EnvCredentials::with_lookup(|_| None))
    }

    fn registry(server: &Server) -> TerraformRegistry {
        TerraformRegistry::new("/v1/modules", no_credentials())
            .unwrap()
            .with_endpoint(&server.url())
    }

    fn public(path: &str) -> RegistryCoordinates {
        RegistryCoordinates::from_base(path, DEFAULT_REGISTRY_HOST).unwrap()
    }

    #[test]
    fn latest_version_returns_numeric_maximum() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/vnet/azurerm/versions")
            .match_header("accept", "application/json")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"modules": [{"versions": [
                    {"version": "2.0.0"},
                    {"version": "10.1.0"},
                    {"version": "9.9.9"}
                ]}]}"#,
            )
            .create();

        let result = registry(&server)
            .latest_version(&public("acme/vnet/azurerm"))
            .unwrap();

        mock.assert();
        assert_eq!(result, LatestVersion::new("10.1.0", 10));
    }

    #[test]
    fn latest_version_returns_not_found_for_404() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/missing/azurerm/versions")
            .with_status(404)
            .with_body(r#"{"errors": ["Not Found"]}"#)
            .create();

        let result = registry(&server).latest_version(&public("acme/missing/azurerm"));

        mock.assert();
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn latest_version_returns_not_found_for_empty_version_list() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/vnet/azurerm/versions")
            .with_status(200)
            .with_body(r#"{"modules": [{"versions": []}]}"#)
            .create();

        let result = registry(&server).latest_version(&public("acme/vnet/azurerm"));

        mock.assert();
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn latest_version_treats_server_error_as_transient() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/vnet/azurerm/versions")
            .with_status(500)
            .create();

        let result = registry(&server).latest_version(&public("acme/vnet/azurerm"));

        mock.assert();
        let err = result.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn latest_version_treats_malformed_versions_as_transient() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/vnet/azurerm/versions")
            .with_status(200)
            .with_body(r#"{"modules": [{"versions": [{"version": "1.0.0"}, {"version": "next"}]}]}"#)
            .create();

        let result = registry(&server).latest_version(&public("acme/vnet/azurerm"));

        mock.assert();
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }

    #[test]
    fn latest_version_treats_undecodable_body_as_transient() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/vnet/azurerm/versions")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let result = registry(&server).latest_version(&public("acme/vnet/azurerm"));

        mock.assert();
        assert!(matches!(result, Err(RegistryError::InvalidResponse(_))));
    }

    #[test]
    fn latest_version_sends_bearer_token_for_private_host() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/registry/v1/modules/platform/vnet/azurerm/versions")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"modules": [{"versions": [{"version": "0.4.1"}]}]}"#)
            .create();

        let credentials: Arc<dyn CredentialSource> =
            Arc::new(EnvCredentials::with_lookup(|name| {
                (name == "TF_TOKEN_app_terraform_io").then(|| "secret".to_string())
            }));
        let registry = TerraformRegistry::new("/api/registry/v1/modules", credentials)
            .unwrap()
            .with_endpoint(&server.url());
        let coords = RegistryCoordinates::new("app.terraform.io", "platform", "vnet", "azurerm");

        let result = registry.latest_version(&coords).unwrap();

        mock.assert();
        assert_eq!(result, LatestVersion::new("0.4.1", 0));
    }

    #[test]
    fn latest_version_never_sends_token_to_public_registry() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/modules/acme/vnet/azurerm/versions")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"modules": [{"versions": [{"version": "1.0.0"}]}]}"#)
            .create();

        let credentials: Arc<dyn CredentialSource> =
            Arc::new(EnvCredentials::with_lookup(|_| Some("leak".to_string())));
        let registry = TerraformRegistry::new("/v1/modules", credentials)
            .unwrap()
            .with_endpoint(&server.url());

        registry
            .latest_version(&public("acme/vnet/azurerm"))
            .unwrap();

        mock.assert();
    }
}

//! Repository identity from the `terraform-<provider>-<module>` naming convention

use std::path::{Path, PathBuf};

use crate::config::RegistryConfig;
use crate::error::BounceError;
use crate::version::registry::RegistryCoordinates;

const REPOSITORY_PREFIX: &str = "terraform-";

/// Provider and module name of the repository being worked on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    pub provider: String,
    pub module_name: String,
}

impl RepositoryIdentity {
    /// Split `terraform-<provider>-<module>` on the first hyphen after the prefix.
    ///
    /// `terraform-azurerm-vnet-peering` yields provider `azurerm` and module
    /// `vnet-peering`.
    pub fn from_name(name: &str) -> Result<Self, BounceError> {
        let invalid = || BounceError::InvalidRepositoryName(name.to_string());

        let rest = name.strip_prefix(REPOSITORY_PREFIX).ok_or_else(invalid)?;
        let (provider, module_name) = rest.split_once('-').ok_or_else(invalid)?;
        if provider.is_empty() || module_name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            provider: provider.to_string(),
            module_name: module_name.to_string(),
        })
    }

    /// Identity of the repository containing `start`.
    ///
    /// Uses the nearest ancestor holding `.git`, else `start` itself.
    pub fn discover(start: &Path) -> Result<Self, BounceError> {
        let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
        let root = repository_root(&start);
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BounceError::InvalidRepositoryName(root.display().to_string()))?;
        Self::from_name(name)
    }

    pub fn coordinates(&self, config: &RegistryConfig) -> RegistryCoordinates {
        RegistryCoordinates::for_module(config, &self.module_name, &self.provider)
    }

    /// Published base for this module, host-qualified only for non-default hosts
    pub fn expected_base(&self, config: &RegistryConfig) -> String {
        let coordinates = self.coordinates(config);
        if config.is_default_host() {
            coordinates.path()
        } else {
            coordinates.to_string()
        }
    }
}

fn repository_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("terraform-azurerm-vnet", "azurerm", "vnet")]
    #[case("terraform-azurerm-vnet-peering", "azurerm", "vnet-peering")]
    #[case("terraform-aws-s3", "aws", "s3")]
    fn from_name_splits_on_first_hyphen(
        #[case] name: &str,
        #[case] provider: &str,
        #[case] module_name: &str,
    ) {
        assert_eq!(
            RepositoryIdentity::from_name(name).unwrap(),
            RepositoryIdentity {
                provider: provider.to_string(),
                module_name: module_name.to_string(),
            }
        );
    }

    #[rstest]
    #[case("vnet")]
    #[case("terraform-azurerm")]
    #[case("terraform--vnet")]
    #[case("terraform-azurerm-")]
    #[case("tf-azurerm-vnet")]
    fn from_name_rejects_unconventional_names(#[case] name: &str) {
        assert!(matches!(
            RepositoryIdentity::from_name(name),
            Err(BounceError::InvalidRepositoryName(_))
        ));
    }

    #[test]
    fn expected_base_omits_default_host() {
        let identity = RepositoryIdentity::from_name("terraform-azurerm-vnet").unwrap();
        assert_eq!(
            identity.expected_base(&RegistryConfig::new("acme")),
            "acme/vnet/azurerm"
        );
    }

    #[test]
    fn expected_base_qualifies_private_host() {
        let identity = RepositoryIdentity::from_name("terraform-azurerm-vnet").unwrap();
        let config = RegistryConfig {
            namespace: "acme".to_string(),
            host: "https://app.terraform.io".to_string(),
            organization: Some("platform".to_string()),
        };
        assert_eq!(
            identity.expected_base(&config),
            "app.terraform.io/platform/vnet/azurerm"
        );
    }

    #[test]
    fn discover_uses_git_root_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("terraform-aws-bucket");
        let nested = root.join("examples/basic");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();

        let identity = RepositoryIdentity::discover(&nested).unwrap();
        assert_eq!(identity.provider, "aws");
        assert_eq!(identity.module_name, "bucket");
    }

    #[test]
    fn discover_falls_back_to_start_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("terraform-google-network");
        std::fs::create_dir_all(&root).unwrap();

        let identity = RepositoryIdentity::discover(&root).unwrap();
        assert_eq!(identity.module_name, "network");
    }
}

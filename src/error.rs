use std::path::PathBuf;

use thiserror::Error;

use crate::version::error::RegistryError;

#[derive(Debug, Error)]
pub enum BounceError {
    #[error("Invalid repository name '{0}': expected terraform-<provider>-<module>")]
    InvalidRepositoryName(String),

    #[error("Registry namespace is not configured")]
    MissingNamespace,

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Worker task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

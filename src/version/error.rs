use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Malformed version: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid module source: {0}")]
    InvalidSource(String),

    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    /// Failures that may succeed on a later run
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RegistryError::Network(_) | RegistryError::InvalidResponse(_)
        )
    }
}

impl From<VersionError> for RegistryError {
    fn from(err: VersionError) -> Self {
        RegistryError::InvalidResponse(err.to_string())
    }
}

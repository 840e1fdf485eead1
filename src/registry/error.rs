//! Registry error types

use crate::error::SessionError;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The source address is empty or blank
    InvalidAddress(String),
    /// The session could not be started
    Start(SessionError),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::InvalidAddress(address) => {
                write!(f, "Invalid source address: {:?}", address)
            }
            RegistryError::Start(e) => write!(f, "Session start failed: {}", e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Start(e) => Some(e),
            RegistryError::InvalidAddress(_) => None,
        }
    }
}

impl From<SessionError> for RegistryError {
    fn from(e: SessionError) -> Self {
        RegistryError::Start(e)
    }
}

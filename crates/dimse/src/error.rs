//! Error types for DIMSE operations

use thiserror::Error;

/// Result type alias for DIMSE operations
pub type Result<T> = std::result::Result<T, DimseError>;

/// Error types that can occur at the DIMSE service boundary
#[derive(Error, Debug)]
pub enum DimseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid AE Title: {0}")]
    InvalidAeTitle(String),
}

impl DimseError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Validate an Application Entity title (1-16 characters, no backslash, not all spaces).
pub fn validate_ae_title(aet: &str) -> Result<()> {
    if aet.is_empty() || aet.len() > 16 {
        return Err(DimseError::InvalidAeTitle(format!(
            "'{}' must be 1-16 characters",
            aet
        )));
    }
    if aet.trim().is_empty() || aet.contains('\\') || aet.chars().any(|c| c.is_control()) {
        return Err(DimseError::InvalidAeTitle(format!(
            "'{}' contains invalid characters",
            aet
        )));
    }
    Ok(())
}

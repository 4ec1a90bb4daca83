//! Bearer-token sources for authenticated DICOMweb endpoints

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("environment variable '{0}' is not set")]
    MissingVariable(String),

    #[error("credential source returned an empty token")]
    EmptyToken,
}

/// Yields the token attached to each outgoing request.
///
/// Called once per request so that rotating tokens are picked up without
/// rebuilding the client.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, CredentialError>;
}

/// A fixed token, mostly useful in tests and for long-lived API keys.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, CredentialError> {
        if self.0.is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every call.
pub struct EnvToken {
    variable: String,
}

impl EnvToken {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for EnvToken {
    async fn bearer_token(&self) -> Result<String, CredentialError> {
        let token = std::env::var(&self.variable)
            .map_err(|_| CredentialError::MissingVariable(self.variable.clone()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(token.to_string())
    }
}

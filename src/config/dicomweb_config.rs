use serde::Deserialize;

use crate::config::ConfigError;
use crate::dicomweb::validation::validate_root_url;

/// Which DICOMweb client implementation talks to a destination
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Authenticated client with streaming STOW-RS
    #[default]
    Standard,
    /// Plain client without store support
    Basic,
}

/// Default DICOMweb destination plus settings shared by every client
#[derive(Debug, Deserialize)]
pub struct DicomWebConfig {
    /// DICOMweb service root, e.g. `https://pacs.example/dicom-web`
    pub url: String,

    #[serde(default)]
    pub backend: BackendKind,

    /// Environment variable holding a bearer token
    #[serde(default)]
    pub auth_token_env: Option<String>,

    /// Connect timeout in seconds. Transfers themselves are not time-limited.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DicomWebConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingDefaultUrl);
        }
        validate_service_url(&self.url)?;
        if let Some(var) = &self.auth_token_env {
            if var.trim().is_empty() {
                return Err(ConfigError::InvalidAuth(
                    "auth_token_env must name a variable".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A filtered destination, evaluated in file order
#[derive(Debug, Deserialize)]
pub struct DestinationConfig {
    /// Query-string style filter such as `AETitle=MODA&Modality=CT`
    pub filter: String,
    pub url: String,
}

/// Endpoints used by the relay command
#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    pub source: String,
    pub sink: String,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_service_url(&self.source)?;
        validate_service_url(&self.sink)
    }
}

/// Check that `value` is an absolute http(s) URL usable as a DICOMweb root.
pub fn validate_service_url(value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        url: value.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: value.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    validate_root_url(value)?;
    Ok(())
}

fn default_timeout_secs() -> u64 {
    30
}

use std::path::Path;

use dimse::{DimseConfig, DimseError};
use serde::Deserialize;
use thiserror::Error;

pub use crate::config::dicomweb_config::{BackendKind, DestinationConfig, DicomWebConfig, RelayConfig};
pub use crate::config::logging_config::LoggingConfig;
pub use crate::config::pipeline_config::{PipelineConfig, RedactionConfig};
pub use crate::config::proxy_config::ProxyConfig;
use crate::config::dicomweb_config::validate_service_url;
use crate::dicomweb::validation::PathValidationError;
use crate::redaction::{RedactionRuleError, TagRedactor};
use crate::router::{AttributeFilter, FilterParseError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("proxy id must not be empty")]
    InvalidProxyID,

    #[error("[dicomweb] url must be set")]
    MissingDefaultUrl,

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    InvalidPath(#[from] PathValidationError),

    #[error("destination {index}: {source}")]
    InvalidFilter {
        index: usize,
        #[source]
        source: FilterParseError,
    },

    #[error("invalid pipeline config: {0}")]
    InvalidPipeline(String),

    #[error("invalid DIMSE config: {0}")]
    InvalidDimse(#[from] DimseError),

    #[error("invalid redaction config: {0}")]
    InvalidRedaction(#[from] RedactionRuleError),

    #[error("invalid auth config: {0}")]
    InvalidAuth(String),

    #[error("invalid logging config: {0}")]
    InvalidLogging(String),

    #[error("[relay] section is required for relaying")]
    MissingRelay,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Whole adapter configuration, loaded from one TOML file
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dimse: DimseConfig,
    pub dicomweb: DicomWebConfig,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub redaction: Option<RedactionConfig>,
    #[serde(default)]
    pub relay: Option<RelayConfig>,
}

impl Config {
    /// Read, parse and validate the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.proxy.validate()?;
        if self.logging.log_to_file && self.logging.log_file_path.trim().is_empty() {
            return Err(ConfigError::InvalidLogging(
                "log_file_path is required when log_to_file is set".to_string(),
            ));
        }
        self.dimse.validate()?;
        self.dicomweb.validate()?;

        for (index, destination) in self.destinations.iter().enumerate() {
            destination
                .filter
                .parse::<AttributeFilter>()
                .map_err(|source| ConfigError::InvalidFilter { index, source })?;
            validate_service_url(&destination.url)?;
        }

        self.pipeline.validate()?;

        if let Some(redaction) = self.redaction.as_ref().filter(|r| r.enabled) {
            TagRedactor::new(&redaction.remove, &redaction.replace)?;
        }
        if let Some(relay) = &self.relay {
            relay.validate()?;
        }
        Ok(())
    }
}

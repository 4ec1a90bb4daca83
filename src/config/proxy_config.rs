use serde::Deserialize;

use crate::config::ConfigError;

/// Identity and verbosity of this adapter instance
#[derive(Debug, Deserialize)]
pub struct ProxyConfig {
    pub id: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            id: "dicom-adapter".to_string(),
            log_level: default_log_level(),
        }
    }
}

impl ProxyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidProxyID);
        }
        Ok(())
    }
}

/// Default log level for the proxy configuration
fn default_log_level() -> String {
    "info".to_string()
}

mod dicomweb_config;
mod logging_config;
mod pipeline_config;
mod proxy_config;
pub mod config;

pub use config::{
    BackendKind, Config, ConfigError, DestinationConfig, DicomWebConfig, LoggingConfig,
    PipelineConfig, ProxyConfig, RedactionConfig, RelayConfig,
};

//! Builds the runtime object graph from a validated [`Config`]

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::info;

use crate::adapters::dimse::CStoreService;
use crate::config::{BackendKind, Config, ConfigError, DicomWebConfig};
use crate::dicomweb::{BasicDicomWebClient, DicomWebClient, EnvToken, HttpDicomWebClient};
use crate::monitoring::MonitoringService;
use crate::redaction::{Redactor, TagRedactor};
use crate::relay::RelaySender;
use crate::router::{AttributeFilter, DestinationRouter};

/// Shared HTTP client. Only connecting is time-limited; large transfers may
/// legitimately run for a long time.
pub fn build_http_client(settings: &DicomWebConfig) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(settings.timeout_secs))
        .gzip(true)
        .build()
        .map_err(ConfigError::HttpClient)
}

/// DICOMweb client for `url`, using the configured backend and credentials.
pub fn build_client(
    http: &reqwest::Client,
    settings: &DicomWebConfig,
    url: &str,
) -> Arc<dyn DicomWebClient> {
    match settings.backend {
        BackendKind::Standard => {
            let client = HttpDicomWebClient::new(http.clone(), url);
            match &settings.auth_token_env {
                Some(var) => Arc::new(client.with_credentials(Arc::new(EnvToken::new(var.clone())))),
                None => Arc::new(client),
            }
        }
        BackendKind::Basic => Arc::new(BasicDicomWebClient::new(http.clone(), url)),
    }
}

pub fn build_router(config: &Config, http: &reqwest::Client) -> Result<DestinationRouter, ConfigError> {
    let default = build_client(http, &config.dicomweb, &config.dicomweb.url);
    let mut router = DestinationRouter::new(default);
    for (index, destination) in config.destinations.iter().enumerate() {
        let filter: AttributeFilter = destination
            .filter
            .parse()
            .map_err(|source| ConfigError::InvalidFilter { index, source })?;
        let client = build_client(http, &config.dicomweb, &destination.url);
        router = router.with_destination(filter, client);
    }
    info!(destinations = config.destinations.len(), "router built");
    Ok(router)
}

/// The configured redactor, or `None` when redaction is absent or disabled.
pub fn build_redactor(config: &Config) -> Result<Option<Arc<dyn Redactor>>, ConfigError> {
    match config.redaction.as_ref().filter(|r| r.enabled) {
        Some(redaction) => {
            let redactor = TagRedactor::new(&redaction.remove, &redaction.replace)?;
            Ok(Some(Arc::new(redactor)))
        }
        None => Ok(None),
    }
}

pub fn build_store_service(
    config: &Config,
    executor: Handle,
    monitor: Arc<dyn MonitoringService>,
) -> Result<CStoreService, ConfigError> {
    let http = build_http_client(&config.dicomweb)?;
    let router = build_router(config, &http)?;
    let mut service = CStoreService::new(Arc::new(router), executor)
        .with_monitor(monitor)
        .with_options(config.pipeline.store_options());
    if let Some(redactor) = build_redactor(config)? {
        service = service.with_redactor(redactor);
    }
    Ok(service)
}

pub fn build_relay(
    config: &Config,
    monitor: Arc<dyn MonitoringService>,
) -> Result<RelaySender, ConfigError> {
    let relay = config.relay.as_ref().ok_or(ConfigError::MissingRelay)?;
    let http = build_http_client(&config.dicomweb)?;
    let source = build_client(&http, &config.dicomweb, &relay.source);
    let sink = build_client(&http, &config.dicomweb, &relay.sink);
    Ok(RelaySender::new(source, sink).with_monitor(monitor))
}

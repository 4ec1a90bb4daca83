//! Copies an object between two DICOMweb endpoints without buffering it

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::dicomweb::{DicomWebClient, ProtocolError};
use crate::monitoring::{Event, MonitoringService, NoopMonitor};
use crate::pipeline::CountingReader;

/// Retrieves from `source` and stores into `sink`, one object at a time.
pub struct RelaySender {
    source: Arc<dyn DicomWebClient>,
    sink: Arc<dyn DicomWebClient>,
    monitor: Arc<dyn MonitoringService>,
}

impl RelaySender {
    pub fn new(source: Arc<dyn DicomWebClient>, sink: Arc<dyn DicomWebClient>) -> Self {
        Self {
            source,
            sink,
            monitor: Arc::new(NoopMonitor),
        }
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn MonitoringService>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Relay the object at `locator`, a path relative to the source prefix.
    /// Returns the number of bytes moved. Failures of either side are
    /// returned unchanged.
    #[instrument(skip(self), fields(source = self.source.service_prefix(), sink = self.sink.service_prefix()))]
    pub async fn send(&self, locator: &str) -> Result<u64, ProtocolError> {
        match self.relay(locator).await {
            Ok(bytes) => {
                self.monitor.add_event(Event::RelayBytes, Some(bytes));
                info!(bytes, "relayed");
                Ok(bytes)
            }
            Err(err) => {
                self.monitor.add_event(Event::RelayError, None);
                error!(error = %err, "relay failed");
                Err(err)
            }
        }
    }

    async fn relay(&self, locator: &str) -> Result<u64, ProtocolError> {
        let body = self.source.retrieve(locator).await?;
        let (mut counted, moved) = CountingReader::new(body);
        self.sink.store(&mut counted).await?;
        Ok(moved.get())
    }
}

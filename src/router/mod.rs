//! Destination selection for incoming instances
//!
//! Filters are evaluated in configuration order; the first match wins and
//! anything unmatched goes to the default destination.

pub mod filter;

use std::fmt;
use std::sync::Arc;

use dicom_object::InMemDicomObject;
use tracing::debug;

pub use filter::{AttributeFilter, DestinationFilter, FilterParseError};

use crate::dicomweb::DicomWebClient;

/// One filtered destination
pub struct Destination {
    pub filter: Box<dyn DestinationFilter>,
    pub client: Arc<dyn DicomWebClient>,
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("filter", &self.filter)
            .field("url", &self.client.service_prefix())
            .finish()
    }
}

pub struct DestinationRouter {
    default: Arc<dyn DicomWebClient>,
    destinations: Vec<Destination>,
}

impl DestinationRouter {
    pub fn new(default: Arc<dyn DicomWebClient>) -> Self {
        Self {
            default,
            destinations: Vec::new(),
        }
    }

    /// Append a destination; earlier destinations take precedence.
    pub fn with_destination(
        mut self,
        filter: impl DestinationFilter + 'static,
        client: Arc<dyn DicomWebClient>,
    ) -> Self {
        self.destinations.push(Destination {
            filter: Box::new(filter),
            client,
        });
        self
    }

    pub fn default_client(&self) -> Arc<dyn DicomWebClient> {
        self.default.clone()
    }

    pub fn has_filters(&self) -> bool {
        !self.destinations.is_empty()
    }

    /// Whether any filter looks at data set attributes. When none does the
    /// payload does not have to be scanned before routing.
    pub fn needs_attributes(&self) -> bool {
        self.destinations.iter().any(|d| d.filter.needs_attributes())
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Pick the client for one instance. Deterministic for equal inputs.
    pub fn select(&self, calling_ae_title: &str, attributes: &InMemDicomObject) -> Arc<dyn DicomWebClient> {
        for (index, destination) in self.destinations.iter().enumerate() {
            if destination.filter.matches(calling_ae_title, attributes) {
                debug!(index, url = destination.client.service_prefix(), "destination filter matched");
                return destination.client.clone();
            }
        }
        self.default.clone()
    }
}

impl fmt::Debug for DestinationRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationRouter")
            .field("default", &self.default.service_prefix())
            .field("destinations", &self.destinations)
            .finish()
    }
}

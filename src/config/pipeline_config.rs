use std::collections::BTreeMap;

use serde::Deserialize;

use crate::adapters::dimse::{StoreOptions, DEFAULT_ROUTING_PREFIX_LIMIT};
use crate::config::ConfigError;
use crate::pipeline::DEFAULT_CONDUIT_CAPACITY;

/// Streaming knobs for the C-STORE path
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    /// Chunks buffered per conduit between two stages
    #[serde(default = "default_conduit_capacity")]
    pub conduit_capacity: usize,

    /// Most bytes read ahead to find routing attributes
    #[serde(default = "default_routing_prefix_limit")]
    pub routing_prefix_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            conduit_capacity: default_conduit_capacity(),
            routing_prefix_limit: default_routing_prefix_limit(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conduit_capacity == 0 {
            return Err(ConfigError::InvalidPipeline(
                "conduit_capacity must be greater than 0".to_string(),
            ));
        }
        if self.routing_prefix_limit == 0 {
            return Err(ConfigError::InvalidPipeline(
                "routing_prefix_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            conduit_capacity: self.conduit_capacity,
            routing_prefix_limit: self.routing_prefix_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Keywords or `(gggg,eeee)` tags to drop
    #[serde(default)]
    pub remove: Vec<String>,

    /// Keyword or tag to replacement value
    #[serde(default)]
    pub replace: BTreeMap<String, String>,
}

fn default_conduit_capacity() -> usize {
    DEFAULT_CONDUIT_CAPACITY
}

fn default_routing_prefix_limit() -> usize {
    DEFAULT_ROUTING_PREFIX_LIMIT
}

fn default_enabled() -> bool {
    true
}

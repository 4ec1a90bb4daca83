//! Configuration types for DIMSE services

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::error::validate_ae_title;
use crate::DEFAULT_DIMSE_PORT;

/// Configuration of the C-STORE SCP the adapter is hosted behind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimseConfig {
    /// Local Application Entity Title
    #[serde(default = "default_local_aet")]
    pub local_aet: String,

    /// Bind address for SCP listener
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,

    /// Port for SCP listener
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum PDU size in bytes
    #[serde(default = "default_max_pdu")]
    pub max_pdu: u32,

    /// Maximum number of concurrent associations
    #[serde(default = "default_max_associations")]
    pub max_associations: u32,
}

impl Default for DimseConfig {
    fn default() -> Self {
        Self {
            local_aet: default_local_aet(),
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_pdu: default_max_pdu(),
            max_associations: default_max_associations(),
        }
    }
}

impl DimseConfig {
    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_ae_title(&self.local_aet)?;

        if self.port == 0 {
            return Err(crate::error::DimseError::config(
                "Port must be greater than 0",
            ));
        }

        if self.max_pdu < 16384 || self.max_pdu > 131072 {
            return Err(crate::error::DimseError::config(
                "Max PDU size must be between 16384 and 131072 bytes",
            ));
        }

        if self.max_associations == 0 {
            return Err(crate::error::DimseError::config(
                "Max associations must be greater than 0",
            ));
        }

        Ok(())
    }
}

// Default value functions
fn default_local_aet() -> String {
    "DICOM_ADAPTER".to_string()
}

fn default_bind_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    DEFAULT_DIMSE_PORT
}

fn default_max_pdu() -> u32 {
    65536
}

fn default_max_associations() -> u32 {
    10
}

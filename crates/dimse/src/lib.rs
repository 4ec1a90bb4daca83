//! DIMSE (DICOM Message Service Element) service boundary
//!
//! This crate holds the types exchanged between the hosting association layer
//! and the C-STORE handler of the adapter. Association negotiation and PDU
//! framing live outside this crate; the host hands over one demultiplexed
//! instance at a time through [`StoreHandler`].
//!
//! # Contents
//! - DICOM status vocabulary ([`DimseStatus`], [`status`] codes)
//! - Per-request C-STORE types ([`StoreRequest`], [`StoreResponse`])
//! - SCP-side configuration ([`DimseConfig`])

pub mod config;
pub mod error;
pub mod service;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use config::DimseConfig;
pub use error::{DimseError, Result};
pub use service::StoreHandler;
pub use status::DimseStatus;
pub use types::{DatasetStream, StoreRequest, StoreResponse};

/// Default DICOM port (non-TLS)
pub const DEFAULT_DIMSE_PORT: u16 = 11112;

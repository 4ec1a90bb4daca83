//! DIMSE side of the adapter: turns inbound C-STOREs into DICOMweb stores

pub mod file_meta;
pub mod routing_prefix;
pub mod store_service;

pub use file_meta::InstanceIdentity;
pub use store_service::{CStoreService, StoreOptions, DEFAULT_ROUTING_PREFIX_LIMIT};

//! Callback seam between the association layer and C-STORE handling

use async_trait::async_trait;

use crate::types::{StoreRequest, StoreResponse};

/// Handler invoked once per inbound C-STORE.
///
/// The association layer owns negotiation and PDU framing; it builds a
/// [`StoreRequest`] for each instance and writes the returned
/// [`StoreResponse`] into the C-STORE-RSP. Implementations must always
/// return a response, mapping every failure onto a DICOM status.
#[async_trait]
pub trait StoreHandler: Send + Sync {
    async fn handle_store(&self, request: StoreRequest) -> StoreResponse;
}

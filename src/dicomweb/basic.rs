use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::{ByteStream, DicomWebClient, DicomWebOperation, HttpDicomWebClient, ProtocolError};

/// Unauthenticated backend for read-only peers.
///
/// Retrieve and query behave exactly like the standard backend; store is
/// rejected without touching the network.
pub struct BasicDicomWebClient {
    inner: HttpDicomWebClient,
}

impl BasicDicomWebClient {
    pub fn new(http: reqwest::Client, service_prefix: impl Into<String>) -> Self {
        Self {
            inner: HttpDicomWebClient::new(http, service_prefix),
        }
    }
}

#[async_trait]
impl DicomWebClient for BasicDicomWebClient {
    async fn retrieve(&self, path: &str) -> Result<ByteStream, ProtocolError> {
        self.inner.retrieve(path).await
    }

    async fn query(&self, path: &str) -> Result<Vec<serde_json::Value>, ProtocolError> {
        self.inner.query(path).await
    }

    async fn store(&self, _stream: &mut (dyn AsyncRead + Send + Unpin)) -> Result<(), ProtocolError> {
        Err(ProtocolError::unsupported(DicomWebOperation::Store))
    }

    fn service_prefix(&self) -> &str {
        self.inner.service_prefix()
    }
}

//! DICOMweb client side: WADO-RS retrieve, QIDO-RS query and STOW-RS store
//!
//! Two backends implement [`DicomWebClient`]:
//! - [`HttpDicomWebClient`], the standard backend, with credentials and a
//!   streaming multipart store
//! - [`BasicDicomWebClient`], a plain request factory that can read but
//!   refuses to store

pub mod basic;
pub mod client;
pub mod credentials;
pub mod error;
pub mod multipart;
pub mod validation;

use async_trait::async_trait;
use tokio::io::AsyncRead;

pub use basic::BasicDicomWebClient;
pub use client::HttpDicomWebClient;
pub use credentials::{CredentialError, CredentialProvider, EnvToken, StaticToken};
pub use error::{DicomWebOperation, ProtocolError};

/// Response body of a retrieve, read lazily from the connection
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Resource the store operation posts to, relative to the service prefix
pub const STUDIES_PATH: &str = "studies";

/// A DICOMweb endpoint rooted at a fixed service prefix.
///
/// Implementations are shared between concurrent requests.
#[async_trait]
pub trait DicomWebClient: Send + Sync {
    /// GET `{prefix}/{path}`, returning the body without buffering it.
    async fn retrieve(&self, path: &str) -> Result<ByteStream, ProtocolError>;

    /// GET `{prefix}/{path}` and parse a JSON array. A 204 yields no results.
    async fn query(&self, path: &str) -> Result<Vec<serde_json::Value>, ProtocolError>;

    /// POST the stream as one `application/dicom` part to `{prefix}/studies`.
    /// Reads the stream to its end unless the request fails first.
    async fn store(&self, stream: &mut (dyn AsyncRead + Send + Unpin)) -> Result<(), ProtocolError>;

    fn service_prefix(&self) -> &str;
}

/// Join a service prefix and a relative path with exactly one `/`.
/// Both are trimmed of separators at either end first.
pub fn join_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_matches('/'), path.trim_matches('/'))
}

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE};
use http::StatusCode;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    join_url, multipart, ByteStream, CredentialProvider, DicomWebClient, DicomWebOperation,
    ProtocolError, STUDIES_PATH,
};

/// Read size when pumping a store payload into the request body
const STORE_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the payload reader and the HTTP connection
const STORE_BODY_DEPTH: usize = 4;

/// Standard DICOMweb backend over a shared `reqwest::Client`
pub struct HttpDicomWebClient {
    http: reqwest::Client,
    service_prefix: String,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl HttpDicomWebClient {
    pub fn new(http: reqwest::Client, service_prefix: impl Into<String>) -> Self {
        Self {
            http,
            service_prefix: service_prefix.into(),
            credentials: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        operation: DicomWebOperation,
    ) -> Result<reqwest::RequestBuilder, ProtocolError> {
        let Some(provider) = &self.credentials else {
            return Ok(request);
        };
        let token = provider.bearer_token().await.map_err(|e| {
            ProtocolError::new(operation, format!("{}: credentials unavailable: {}", operation, e))
        })?;
        Ok(request
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT_ENCODING, "gzip"))
    }
}

#[async_trait]
impl DicomWebClient for HttpDicomWebClient {
    #[instrument(skip(self), fields(prefix = %self.service_prefix))]
    async fn retrieve(&self, path: &str) -> Result<ByteStream, ProtocolError> {
        let operation = DicomWebOperation::Retrieve;
        let request = self
            .http
            .get(join_url(&self.service_prefix, path))
            .header(ACCEPT, "application/dicom; transfer-syntax=*");
        let request = self.authorize(request, operation).await?;

        let response = request
            .send()
            .await
            .map_err(|e| ProtocolError::transport(operation, e))?;
        let response = ensure_success(operation, response).await?;

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }

    #[instrument(skip(self), fields(prefix = %self.service_prefix))]
    async fn query(&self, path: &str) -> Result<Vec<serde_json::Value>, ProtocolError> {
        let operation = DicomWebOperation::Query;
        let request = self
            .http
            .get(join_url(&self.service_prefix, path))
            .header(ACCEPT, "application/dicom+json");
        let request = self.authorize(request, operation).await?;

        let response = request
            .send()
            .await
            .map_err(|e| ProtocolError::transport(operation, e))?;
        if response.status() == StatusCode::NO_CONTENT {
            debug!("no matches");
            return Ok(Vec::new());
        }
        let response = ensure_success(operation, response).await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::transport(operation, e))?;
        serde_json::from_slice(&body).map_err(|e| {
            ProtocolError::new(
                operation,
                format!("{}: response is not a JSON array: {}", operation, e),
            )
        })
    }

    #[instrument(skip_all, fields(prefix = %self.service_prefix))]
    async fn store(&self, stream: &mut (dyn AsyncRead + Send + Unpin)) -> Result<(), ProtocolError> {
        let operation = DicomWebOperation::Store;
        let boundary = Uuid::new_v4().to_string();

        let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(STORE_BODY_DEPTH);
        let request = self
            .http
            .post(join_url(&self.service_prefix, STUDIES_PATH))
            .header(CONTENT_TYPE, multipart::content_type(&boundary))
            .header(ACCEPT, "application/dicom+json")
            .body(reqwest::Body::wrap_stream(ReceiverStream::new(rx)));
        let request = self.authorize(request, operation).await?;

        let (sent, pumped) = tokio::join!(request.send(), pump_part(stream, tx, &boundary));

        // A failed payload read is the root cause of whatever the request saw
        let bytes = pumped.map_err(|e| ProtocolError::io(operation, e))?;
        let response = sent.map_err(|e| ProtocolError::transport(operation, e))?;
        ensure_success(operation, response).await?;

        debug!(bytes, "instance stored");
        Ok(())
    }

    fn service_prefix(&self) -> &str {
        &self.service_prefix
    }
}

/// Turn any non-2xx response into a `ProtocolError`, keeping its body text.
async fn ensure_success(
    operation: DicomWebOperation,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProtocolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProtocolError::http(operation, status, &body))
}

/// Copy the payload into the request body, framed as a single part.
///
/// Returns the number of payload bytes forwarded. Stops quietly when the
/// request side hangs up, since the response then carries the real outcome.
/// A read failure poisons the body so the server never sees a complete part.
async fn pump_part(
    stream: &mut (dyn AsyncRead + Send + Unpin),
    tx: mpsc::Sender<io::Result<Bytes>>,
    boundary: &str,
) -> io::Result<u64> {
    if tx
        .send(Ok(Bytes::from(multipart::part_header(boundary))))
        .await
        .is_err()
    {
        return Ok(0);
    }

    let mut total = 0u64;
    let mut buf = vec![0u8; STORE_CHUNK_SIZE];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                let _ = tx
                    .send(Err(io::Error::new(err.kind(), err.to_string())))
                    .await;
                return Err(err);
            }
        };
        total += n as u64;
        if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
            return Ok(total);
        }
    }

    let _ = tx
        .send(Ok(Bytes::from(multipart::closing_delimiter(boundary))))
        .await;
    Ok(total)
}

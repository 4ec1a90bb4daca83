//! DICOMweb failure vocabulary
//!
//! Every outcome of a DICOMweb call that is not a success is normalised into a
//! [`ProtocolError`] carrying a DICOM status, so callers on the DIMSE side never
//! have to know which HTTP backend produced it.
//!
//! # Status table
//!
//! | Operation | Failure status |
//! |-----------|----------------|
//! | WADO-RS retrieve | `0x0110` Processing failure |
//! | QIDO-RS query | `0xA701` Unable to calculate number of matches |
//! | STOW-RS store | `0x0110` Processing failure |

use std::fmt;

use dimse::status;
use http::StatusCode;
use thiserror::Error;

/// The three DICOMweb transactions the adapter issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DicomWebOperation {
    Retrieve,
    Query,
    Store,
}

impl DicomWebOperation {
    /// DICOM status reported when this operation fails
    pub fn failure_status(self) -> u16 {
        match self {
            DicomWebOperation::Retrieve => status::PROCESSING_FAILURE,
            DicomWebOperation::Query => status::UNABLE_TO_CALCULATE_NUMBER_OF_MATCHES,
            DicomWebOperation::Store => status::PROCESSING_FAILURE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DicomWebOperation::Retrieve => "WadoRs",
            DicomWebOperation::Query => "QidoRs",
            DicomWebOperation::Store => "StowRs",
        }
    }
}

impl fmt::Display for DicomWebOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProtocolError {
    pub message: String,
    pub http_status: Option<u16>,
    pub dicom_status: u16,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProtocolError {
    pub fn new(operation: DicomWebOperation, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
            dicom_status: operation.failure_status(),
            source: None,
        }
    }

    /// Non-success HTTP response. The body text is kept for diagnostics and
    /// falls back to the reason phrase when the server sent none.
    pub fn http(operation: DicomWebOperation, status: StatusCode, body: &str) -> Self {
        let detail = match body.trim() {
            "" => status.canonical_reason().unwrap_or("").to_string(),
            text => text.to_string(),
        };
        Self {
            message: format!("{}: {}, {}", operation, status.as_u16(), detail),
            http_status: Some(status.as_u16()),
            dicom_status: operation.failure_status(),
            source: None,
        }
    }

    /// Connection failure, timeout, or a response that could not be read.
    pub fn transport(operation: DicomWebOperation, err: reqwest::Error) -> Self {
        Self {
            message: format!("{}: {}", operation, err),
            http_status: err.status().map(|s| s.as_u16()),
            dicom_status: operation.failure_status(),
            source: Some(Box::new(err)),
        }
    }

    pub fn io(operation: DicomWebOperation, err: std::io::Error) -> Self {
        Self {
            message: format!("{}: {}", operation, err),
            http_status: None,
            dicom_status: operation.failure_status(),
            source: Some(Box::new(err)),
        }
    }

    pub fn unsupported(operation: DicomWebOperation) -> Self {
        Self {
            message: format!("{}: not implemented by this backend", operation),
            http_status: None,
            dicom_status: status::PROCESSING_FAILURE,
            source: None,
        }
    }
}

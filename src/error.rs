use dimse::status;
use thiserror::Error;

use crate::dicomweb::ProtocolError;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a C-STORE can end in. Each variant maps onto exactly one
/// DICOM status through [`Error::dicom_status`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redaction error: {0}")]
    Redaction(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("DICOM error: {0}")]
    Dicom(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl Error {
    /// Status reported back on the DIMSE side for this failure.
    pub fn dicom_status(&self) -> u16 {
        match self {
            Error::Protocol(err) => err.dicom_status,
            Error::Validation(_) => status::CANNOT_UNDERSTAND,
            _ => status::PROCESSING_FAILURE,
        }
    }
}

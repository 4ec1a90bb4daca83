//! Common types for DIMSE operations

use std::fmt;

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use tokio::io::AsyncRead;

use crate::status::{self, DimseStatus};

/// Live byte stream of one instance's data set, positioned at its first byte.
pub type DatasetStream = Box<dyn AsyncRead + Send + Unpin>;

/// One inbound C-STORE, as handed over by the association layer
pub struct StoreRequest {
    /// AE title of the calling peer
    pub calling_ae_title: String,

    /// Transfer syntax negotiated for the presentation context
    pub transfer_syntax: String,

    /// C-STORE-RQ command set
    pub command: InMemDicomObject,

    /// Data set bytes, demultiplexed from the P-DATA stream
    pub dataset: DatasetStream,
}

impl StoreRequest {
    pub fn new(
        calling_ae_title: impl Into<String>,
        transfer_syntax: impl Into<String>,
        command: InMemDicomObject,
        dataset: DatasetStream,
    ) -> Self {
        Self {
            calling_ae_title: calling_ae_title.into(),
            transfer_syntax: transfer_syntax.into(),
            command,
            dataset,
        }
    }

    /// Affected SOP Class UID (0000,0002), trimmed of padding
    pub fn affected_sop_class_uid(&self) -> Option<String> {
        command_str(&self.command, tags::AFFECTED_SOP_CLASS_UID)
    }

    /// Affected SOP Instance UID (0000,1000), trimmed of padding
    pub fn affected_sop_instance_uid(&self) -> Option<String> {
        command_str(&self.command, tags::AFFECTED_SOP_INSTANCE_UID)
    }

    /// Message ID (0000,0110)
    pub fn message_id(&self) -> Option<u16> {
        self.command
            .element(tags::MESSAGE_ID)
            .ok()
            .and_then(|e| e.to_int::<u16>().ok())
    }
}

impl fmt::Debug for StoreRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRequest")
            .field("calling_ae_title", &self.calling_ae_title)
            .field("transfer_syntax", &self.transfer_syntax)
            .field("sop_class_uid", &self.affected_sop_class_uid())
            .field("sop_instance_uid", &self.affected_sop_instance_uid())
            .finish_non_exhaustive()
    }
}

fn command_str(command: &InMemDicomObject, tag: Tag) -> Option<String> {
    command
        .element(tag)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string())
        .filter(|s| !s.is_empty())
}

/// Terminal answer to one C-STORE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub status: DimseStatus,

    /// Error Comment (0000,0902), set on failures
    pub error_comment: Option<String>,
}

impl StoreResponse {
    pub fn success() -> Self {
        Self {
            status: DimseStatus::Success,
            error_comment: None,
        }
    }

    pub fn failure(code: u16, comment: impl Into<String>) -> Self {
        Self {
            status: DimseStatus::from_code(code),
            error_comment: Some(comment.into()),
        }
    }

    /// Shorthand for a generic processing failure
    pub fn processing_failure(comment: impl Into<String>) -> Self {
        Self::failure(status::PROCESSING_FAILURE, comment)
    }
}

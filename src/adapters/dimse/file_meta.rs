//! Part-10 file-meta header for data sets arriving over DIMSE
//!
//! A C-STORE delivers the bare data set. DICOMweb stores expect a Part-10
//! object, so the header (preamble, `DICM` magic, group 0002) is built from
//! the instance identity and streamed ahead of the payload.

use std::io::Cursor;

use dicom_object::meta::{FileMetaTable, FileMetaTableBuilder};
use dimse::StoreRequest;
use tokio::io::AsyncReadExt;

use crate::error::{Error, Result};
use crate::pipeline::StageInput;

pub const PREAMBLE_LEN: usize = 128;

const MAGIC: &[u8; 4] = b"DICM";

/// The three values a Part-10 header is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub transfer_syntax: String,
}

impl InstanceIdentity {
    /// Take the identity from a C-STORE request, rejecting empty values.
    pub fn from_request(request: &StoreRequest) -> Result<Self> {
        let sop_class_uid = request
            .affected_sop_class_uid()
            .ok_or_else(|| Error::Validation("Mandatory tag empty: AffectedSOPClassUID".to_string()))?;
        let sop_instance_uid = request
            .affected_sop_instance_uid()
            .ok_or_else(|| Error::Validation("Mandatory tag empty: AffectedSOPInstanceUID".to_string()))?;
        let transfer_syntax = request
            .transfer_syntax
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string();
        if transfer_syntax.is_empty() {
            return Err(Error::Validation("Mandatory tag empty: TransferSyntaxUID".to_string()));
        }
        Ok(Self {
            sop_class_uid,
            sop_instance_uid,
            transfer_syntax,
        })
    }

    pub fn file_meta(&self) -> Result<FileMetaTable> {
        FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(self.sop_class_uid.as_str())
            .media_storage_sop_instance_uid(self.sop_instance_uid.as_str())
            .transfer_syntax(self.transfer_syntax.as_str())
            .build()
            .map_err(|e| Error::Dicom(format!("failed to build file meta: {}", e)))
    }
}

/// Preamble, magic code and encoded file-meta group.
pub fn part10_header(meta: &FileMetaTable) -> Result<Vec<u8>> {
    let mut group = Vec::new();
    meta.write(&mut group)
        .map_err(|e| Error::Dicom(format!("failed to encode file meta: {}", e)))?;

    let mut header = Vec::with_capacity(PREAMBLE_LEN + MAGIC.len() + group.len());
    header.resize(PREAMBLE_LEN, 0);
    // Some encoder versions emit the magic code themselves
    if !group.starts_with(MAGIC) {
        header.extend_from_slice(MAGIC);
    }
    header.extend_from_slice(&group);
    Ok(header)
}

/// Stream the Part-10 header for `identity` followed by `payload`.
pub fn with_file_meta_header(identity: &InstanceIdentity, payload: StageInput) -> Result<StageInput> {
    let header = part10_header(&identity.file_meta()?)?;
    Ok(Box::new(Cursor::new(header).chain(payload)))
}

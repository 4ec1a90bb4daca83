//! Attribute redaction applied to objects on their way to a destination
//!
//! The pipeline treats a [`Redactor`] as an opaque stream transformer. The one
//! shipped here, [`TagRedactor`], removes or overwrites configured top-level
//! attributes. It parses the whole object, so it buffers one instance.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dicom_core::dictionary::DataDictionary;
use dicom_core::{DataElement, PrimitiveValue, Tag};
use dicom_dictionary_std::StandardDataDictionary;
use dicom_encoding::transfer_syntax::TransferSyntaxIndex;
use dicom_transfer_syntax_registry::TransferSyntaxRegistry;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::adapters::dimse::file_meta::{part10_header, PREAMBLE_LEN};
use crate::error::{Error, Result};

/// Transforms one Part-10 stream into another.
#[async_trait]
pub trait Redactor: Send + Sync {
    async fn redact(
        &self,
        input: &mut (dyn AsyncRead + Send + Unpin),
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedactionRuleError {
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("redaction has nothing to remove or replace")]
    Empty,
}

/// Resolve a keyword such as `PatientName` or a tag such as `(0010,0010)`.
pub fn parse_attribute(name: &str) -> Option<Tag> {
    let name = name.trim();
    let bare = name.trim_start_matches('(').trim_end_matches(')');
    if let Some((group, element)) = bare.split_once(',') {
        let group = u16::from_str_radix(group.trim(), 16).ok()?;
        let element = u16::from_str_radix(element.trim(), 16).ok()?;
        return Some(Tag(group, element));
    }
    StandardDataDictionary.parse_tag(name)
}

/// Removes and replaces top-level attributes by tag
#[derive(Debug, Clone)]
pub struct TagRedactor {
    remove: Vec<Tag>,
    replace: Vec<(Tag, String)>,
}

impl TagRedactor {
    pub fn new(
        remove: &[String],
        replace: &BTreeMap<String, String>,
    ) -> std::result::Result<Self, RedactionRuleError> {
        if remove.is_empty() && replace.is_empty() {
            return Err(RedactionRuleError::Empty);
        }
        let remove = remove
            .iter()
            .map(|name| {
                parse_attribute(name).ok_or_else(|| RedactionRuleError::UnknownAttribute(name.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let replace = replace
            .iter()
            .map(|(name, value)| {
                parse_attribute(name)
                    .map(|tag| (tag, value.clone()))
                    .ok_or_else(|| RedactionRuleError::UnknownAttribute(name.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { remove, replace })
    }

    /// Redact a complete Part-10 object held in memory.
    pub fn redact_bytes(&self, part10: &[u8]) -> Result<Vec<u8>> {
        let body = part10
            .get(PREAMBLE_LEN..)
            .filter(|body| body.starts_with(b"DICM"))
            .ok_or_else(|| Error::Redaction("input is not a Part-10 stream".to_string()))?;

        let mut object = dicom_object::from_reader(body)
            .map_err(|e| Error::Redaction(format!("failed to parse object: {}", e)))?;

        let ts_uid = object.meta().transfer_syntax().trim_end_matches('\0').to_string();
        let ts = TransferSyntaxRegistry
            .get(&ts_uid)
            .ok_or_else(|| Error::Redaction(format!("unsupported transfer syntax {}", ts_uid)))?;
        let mut out = part10_header(object.meta())?;

        let dataset = &mut *object;
        for tag in &self.remove {
            if dataset.remove_element(*tag) {
                debug!(%tag, "attribute removed");
            }
        }
        for (tag, value) in &self.replace {
            // Only attributes present in the object are overwritten
            let Some(vr) = dataset.element(*tag).ok().map(|e| e.vr()) else {
                continue;
            };
            dataset.put(DataElement::new(*tag, vr, PrimitiveValue::from(value.as_str())));
            debug!(%tag, "attribute replaced");
        }

        dataset
            .write_dataset_with_ts(&mut out, ts)
            .map_err(|e| Error::Redaction(format!("failed to write object: {}", e)))?;
        Ok(out)
    }
}

#[async_trait]
impl Redactor for TagRedactor {
    async fn redact(
        &self,
        input: &mut (dyn AsyncRead + Send + Unpin),
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<()> {
        let mut part10 = Vec::new();
        input.read_to_end(&mut part10).await?;
        let redactor = self.clone();
        let redacted = tokio::task::spawn_blocking(move || redactor.redact_bytes(&part10))
            .await
            .map_err(|e| Error::Redaction(format!("redaction task failed: {}", e)))??;
        output.write_all(&redacted).await?;
        output.flush().await?;
        Ok(())
    }
}

//! Stages the C-STORE path assembles into a pipeline

use std::sync::Arc;

use async_trait::async_trait;

use super::executor::{StageInput, StageOutput, StreamStage};
use crate::dicomweb::DicomWebClient;
use crate::error::{Error, Result};
use crate::redaction::Redactor;

/// Runs a [`Redactor`] between two conduits
pub struct RedactStage {
    redactor: Arc<dyn Redactor>,
}

impl RedactStage {
    pub fn new(redactor: Arc<dyn Redactor>) -> Self {
        Self { redactor }
    }
}

#[async_trait]
impl StreamStage for RedactStage {
    fn name(&self) -> &str {
        "redact"
    }

    async fn process(&self, input: &mut StageInput, output: Option<&mut StageOutput>) -> Result<()> {
        let output = output
            .ok_or_else(|| Error::Pipeline("redact stage needs a downstream stage".to_string()))?;
        self.redactor.redact(&mut **input, &mut **output).await
    }
}

/// Terminal stage posting the stream to a DICOMweb store endpoint
pub struct UploadStage {
    client: Arc<dyn DicomWebClient>,
}

impl UploadStage {
    pub fn new(client: Arc<dyn DicomWebClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamStage for UploadStage {
    fn name(&self) -> &str {
        "upload"
    }

    async fn process(&self, input: &mut StageInput, output: Option<&mut StageOutput>) -> Result<()> {
        if output.is_some() {
            return Err(Error::Pipeline("upload must be the last stage".to_string()));
        }
        self.client.store(&mut **input).await?;
        Ok(())
    }
}

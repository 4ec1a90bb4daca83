//! C-STORE to STOW-RS forwarding
//!
//! Each request is validated, routed, given a Part-10 header and streamed
//! through an optional redaction stage into an upload stage. The response
//! status comes from the first failure, or Success.

use std::sync::Arc;

use async_trait::async_trait;
use dicom_object::InMemDicomObject;
use dimse::{StoreHandler, StoreRequest, StoreResponse};
use tokio::runtime::Handle;
use tracing::{error, info, instrument};

use super::file_meta::{with_file_meta_header, InstanceIdentity};
use super::routing_prefix::scan_attributes;
use crate::error::Result;
use crate::monitoring::{Event, MonitoringService, NoopMonitor};
use crate::pipeline::{
    CountingReader, RedactStage, StageInput, StreamPipeline, StreamStage, UploadStage,
    DEFAULT_CONDUIT_CAPACITY,
};
use crate::redaction::Redactor;
use crate::router::DestinationRouter;

/// Default cap on bytes buffered while looking for routing attributes
pub const DEFAULT_ROUTING_PREFIX_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub conduit_capacity: usize,
    pub routing_prefix_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            conduit_capacity: DEFAULT_CONDUIT_CAPACITY,
            routing_prefix_limit: DEFAULT_ROUTING_PREFIX_LIMIT,
        }
    }
}

pub struct CStoreService {
    router: Arc<DestinationRouter>,
    redactor: Option<Arc<dyn Redactor>>,
    monitor: Arc<dyn MonitoringService>,
    pipeline: StreamPipeline,
    options: StoreOptions,
}

impl CStoreService {
    pub fn new(router: Arc<DestinationRouter>, executor: Handle) -> Self {
        let options = StoreOptions::default();
        Self {
            router,
            redactor: None,
            monitor: Arc::new(NoopMonitor),
            pipeline: StreamPipeline::new(executor).with_conduit_capacity(options.conduit_capacity),
            options,
        }
    }

    pub fn with_redactor(mut self, redactor: Arc<dyn Redactor>) -> Self {
        self.redactor = Some(redactor);
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn MonitoringService>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.pipeline = self.pipeline.with_conduit_capacity(options.conduit_capacity);
        self.options = options;
        self
    }

    /// Forward one instance, returning the payload bytes read from the peer.
    #[instrument(skip_all, fields(calling_aet = %request.calling_ae_title))]
    pub async fn store(&self, request: StoreRequest) -> Result<u64> {
        let identity = InstanceIdentity::from_request(&request)?;
        info!(
            sop_class_uid = %identity.sop_class_uid,
            sop_instance_uid = %identity.sop_instance_uid,
            transfer_syntax = %identity.transfer_syntax,
            "C-STORE received"
        );

        let StoreRequest {
            calling_ae_title,
            dataset,
            ..
        } = request;
        let (counting, received) = CountingReader::new(dataset);
        let mut payload: StageInput = Box::new(counting);

        let destination = if self.router.needs_attributes() {
            let scanned = scan_attributes(
                &mut payload,
                &identity.transfer_syntax,
                self.options.routing_prefix_limit,
            )
            .await?;
            let (attributes, replayed) = scanned.replay(payload);
            payload = replayed;
            self.router.select(&calling_ae_title, &attributes)
        } else if self.router.has_filters() {
            self.router.select(&calling_ae_title, &InMemDicomObject::new_empty())
        } else {
            self.router.default_client()
        };
        info!(destination = destination.service_prefix(), "routing instance");

        let source = with_file_meta_header(&identity, payload)?;

        let mut stages: Vec<Arc<dyn StreamStage>> = Vec::with_capacity(2);
        if let Some(redactor) = &self.redactor {
            stages.push(Arc::new(RedactStage::new(redactor.clone())));
        }
        stages.push(Arc::new(UploadStage::new(destination)));

        self.pipeline.run(source, stages).await?;
        Ok(received.get())
    }
}

#[async_trait]
impl StoreHandler for CStoreService {
    async fn handle_store(&self, request: StoreRequest) -> StoreResponse {
        self.monitor.add_event(Event::CStoreRequest, None);
        let sop_instance_uid = request.affected_sop_instance_uid();

        match self.store(request).await {
            Ok(bytes) => {
                self.monitor.add_event(Event::CStoreBytes, Some(bytes));
                info!(sop_instance_uid = ?sop_instance_uid, bytes, "C-STORE forwarded");
                StoreResponse::success()
            }
            Err(err) => {
                self.monitor.add_event(Event::CStoreError, None);
                error!(sop_instance_uid = ?sop_instance_uid, error = %err, "C-STORE failed");
                StoreResponse::failure(err.dicom_status(), err.to_string())
            }
        }
    }
}

mod cli;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::tags;
use dicom_encoding::transfer_syntax::TransferSyntaxIndex;
use dicom_object::InMemDicomObject;
use dicom_transfer_syntax_registry::TransferSyntaxRegistry;
use dimse::{StoreHandler, StoreRequest};
use tokio::runtime::Handle;

use dicom_adapter::bootstrap;
use dicom_adapter::config::Config;
use dicom_adapter::monitoring::{LogMonitor, MonitoringService};

use crate::cli::{Cli, Cmd};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    dicom_adapter::init_tracing(&config)?;
    let monitor: Arc<dyn MonitoringService> = Arc::new(LogMonitor);

    match cli.cmd {
        Cmd::Store { file, calling_aet } => {
            let service = bootstrap::build_store_service(&config, Handle::current(), monitor)?;
            let request = request_from_file(&file, &calling_aet)?;
            let response = service.handle_store(request).await;
            println!("{}", response.status);
            if !response.status.is_success() {
                bail!(
                    "C-STORE failed: {}",
                    response.error_comment.unwrap_or_default()
                );
            }
            Ok(())
        }
        Cmd::Relay { locators } => {
            let relay = bootstrap::build_relay(&config, monitor)?;
            let mut failed = 0;
            for locator in &locators {
                match relay.send(locator).await {
                    Ok(bytes) => println!("{locator}: {bytes} bytes"),
                    Err(err) => {
                        eprintln!("{locator}: {err}");
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} relays failed", locators.len());
            }
            Ok(())
        }
        Cmd::Query { path } => {
            let http = bootstrap::build_http_client(&config.dicomweb)?;
            let client = bootstrap::build_client(&http, &config.dicomweb, &config.dicomweb.url);
            let results = client.query(&path).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Cmd::Check => {
            println!("configuration OK: {}", cli.config.display());
            Ok(())
        }
    }
}

/// Build the C-STORE a peer would send for the Part-10 file at `path`.
fn request_from_file(path: &Path, calling_aet: &str) -> anyhow::Result<StoreRequest> {
    let object = dicom_object::open_file(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let meta = object.meta();
    let ts_uid = meta.transfer_syntax().trim_end_matches('\0').to_string();
    let ts = TransferSyntaxRegistry
        .get(&ts_uid)
        .ok_or_else(|| anyhow!("unsupported transfer syntax {ts_uid}"))?;

    let mut command = InMemDicomObject::new_empty();
    command.put(DataElement::new(
        tags::AFFECTED_SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(meta.media_storage_sop_class_uid()),
    ));
    command.put(DataElement::new(
        tags::AFFECTED_SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(meta.media_storage_sop_instance_uid()),
    ));
    command.put(DataElement::new(tags::MESSAGE_ID, VR::US, PrimitiveValue::from(1_u16)));

    let dataset: &InMemDicomObject = &object;
    let mut bytes = Vec::new();
    dataset.write_dataset_with_ts(&mut bytes, ts)?;

    Ok(StoreRequest::new(
        calling_aet,
        ts_uid,
        command,
        Box::new(Cursor::new(bytes)),
    ))
}

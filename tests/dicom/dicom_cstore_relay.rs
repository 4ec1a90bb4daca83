#[path = "../common/mock_dicomweb.rs"]
mod mock_dicomweb;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use dicom_adapter::adapters::dimse::CStoreService;
use dicom_adapter::bootstrap;
use dicom_adapter::config::Config;
use dicom_adapter::dicomweb::{DicomWebClient, HttpDicomWebClient};
use dicom_adapter::monitoring::{Event, InMemoryMonitor, MonitoringService};
use dicom_adapter::redaction::TagRedactor;
use dicom_adapter::router::{AttributeFilter, DestinationRouter};
use dicom_dictionary_std::{tags, uids};
use dicom_object::InMemDicomObject;
use dimse::{status, StoreHandler, StoreRequest};
use tokio::runtime::Handle;

fn client(prefix: String) -> Arc<dyn DicomWebClient> {
    Arc::new(HttpDicomWebClient::new(reqwest::Client::new(), prefix))
}

fn request(calling_aet: &str, uid: &str, modality: &str) -> (StoreRequest, Vec<u8>) {
    let dataset = mock_dicomweb::dataset_bytes(&mock_dicomweb::dataset(uid, modality));
    let request = StoreRequest::new(
        calling_aet,
        uids::EXPLICIT_VR_LITTLE_ENDIAN,
        mock_dicomweb::command(uid),
        Box::new(Cursor::new(dataset.clone())),
    );
    (request, dataset)
}

#[tokio::test]
async fn test_store_to_default_destination() {
    let server = mock_dicomweb::start().await;
    let monitor = Arc::new(InMemoryMonitor::new());
    let router = DestinationRouter::new(client(server.prefix()));
    let service = CStoreService::new(Arc::new(router), Handle::current())
        .with_monitor(monitor.clone() as Arc<dyn MonitoringService>);

    let (request, dataset) = request("MODA", "1.2.3.100", "CT");
    let response = service.handle_store(request).await;
    assert!(response.status.is_success(), "{:?}", response);

    let stores = server.state.stores();
    assert_eq!(stores.len(), 1);
    let part = stores[0].part();
    assert!(part[..128].iter().all(|b| *b == 0));
    assert!(part.ends_with(&dataset));

    let object = mock_dicomweb::parse_part10(&part);
    assert_eq!(
        object.meta().media_storage_sop_instance_uid().trim_end_matches('\0'),
        "1.2.3.100"
    );
    assert_eq!(
        object.meta().transfer_syntax().trim_end_matches('\0'),
        uids::EXPLICIT_VR_LITTLE_ENDIAN
    );
    assert_eq!(mock_dicomweb::text(&object, tags::PATIENT_NAME).as_deref(), Some("Doe^Jane"));

    assert_eq!(monitor.count(Event::CStoreRequest), 1);
    assert_eq!(monitor.values(Event::CStoreBytes), vec![dataset.len() as u64]);
    assert_eq!(monitor.count(Event::CStoreError), 0);
}

#[tokio::test]
async fn test_first_matching_destination_wins() {
    let default = mock_dicomweb::start().await;
    let mr = mock_dicomweb::start().await;
    let moda = mock_dicomweb::start().await;

    let router = DestinationRouter::new(client(default.prefix()))
        .with_destination("Modality=MR".parse::<AttributeFilter>().unwrap(), client(mr.prefix()))
        .with_destination("AETitle=MODA".parse::<AttributeFilter>().unwrap(), client(moda.prefix()));
    let service = CStoreService::new(Arc::new(router), Handle::current());

    for (aet, uid, modality) in [
        ("MODA", "1.2.3.1", "MR"),
        ("MODA", "1.2.3.2", "CT"),
        ("OTHER", "1.2.3.3", "CT"),
    ] {
        let (request, _) = request(aet, uid, modality);
        let response = service.handle_store(request).await;
        assert!(response.status.is_success(), "{:?}", response);
    }

    let landed = |server: &mock_dicomweb::MockDicomWeb| {
        server
            .state
            .stores()
            .iter()
            .map(|s| {
                let object = mock_dicomweb::parse_part10(&s.part());
                object.meta().media_storage_sop_instance_uid().trim_end_matches('\0').to_string()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(landed(&mr), vec!["1.2.3.1"]);
    assert_eq!(landed(&moda), vec!["1.2.3.2"]);
    assert_eq!(landed(&default), vec!["1.2.3.3"]);
}

#[tokio::test]
async fn test_missing_identity_fails_before_any_request() {
    let server = mock_dicomweb::start().await;
    let monitor = Arc::new(InMemoryMonitor::new());
    let service = CStoreService::new(
        Arc::new(DestinationRouter::new(client(server.prefix()))),
        Handle::current(),
    )
    .with_monitor(monitor.clone() as Arc<dyn MonitoringService>);

    let request = StoreRequest::new(
        "MODA",
        uids::EXPLICIT_VR_LITTLE_ENDIAN,
        InMemDicomObject::new_empty(),
        Box::new(Cursor::new(vec![0u8; 16])),
    );
    let response = service.handle_store(request).await;

    assert_eq!(response.status.code(), status::CANNOT_UNDERSTAND);
    assert!(response
        .error_comment
        .as_deref()
        .unwrap_or_default()
        .contains("Mandatory tag empty"));
    assert_eq!(server.state.hits(), 0);
    assert_eq!(monitor.count(Event::CStoreError), 1);
    assert!(monitor.values(Event::CStoreBytes).is_empty());
}

#[tokio::test]
async fn test_upstream_failure_maps_to_processing_failure() {
    let server = mock_dicomweb::start().await;
    let service = CStoreService::new(
        Arc::new(DestinationRouter::new(client(server.failing_prefix()))),
        Handle::current(),
    );

    let (request, _) = request("MODA", "1.2.3.200", "CT");
    let response = service.handle_store(request).await;

    assert_eq!(response.status.code(), status::PROCESSING_FAILURE);
    let comment = response.error_comment.unwrap_or_default();
    assert!(comment.contains("500"), "{comment}");
    assert!(comment.contains("internal error"), "{comment}");
}

#[tokio::test]
async fn test_redaction_is_applied_before_upload() {
    let server = mock_dicomweb::start().await;
    let mut replace = BTreeMap::new();
    replace.insert("PatientName".to_string(), "ANON".to_string());
    let redactor = TagRedactor::new(&["PatientBirthDate".to_string()], &replace).unwrap();

    let service = CStoreService::new(
        Arc::new(DestinationRouter::new(client(server.prefix()))),
        Handle::current(),
    )
    .with_redactor(Arc::new(redactor));

    let (request, _) = request("MODA", "1.2.3.300", "CT");
    let response = service.handle_store(request).await;
    assert!(response.status.is_success(), "{:?}", response);

    let object = mock_dicomweb::parse_part10(&server.state.stores()[0].part());
    assert_eq!(mock_dicomweb::text(&object, tags::PATIENT_NAME).as_deref(), Some("ANON"));
    assert!(object.element(tags::PATIENT_BIRTH_DATE).is_err());
    assert_eq!(mock_dicomweb::text(&object, tags::MODALITY).as_deref(), Some("CT"));
    assert_eq!(object.element(tags::PIXEL_DATA).unwrap().to_bytes().unwrap().len(), 4096);
}

#[tokio::test]
async fn test_service_built_from_config() {
    let default = mock_dicomweb::start().await;
    let mr = mock_dicomweb::start().await;
    let config = Config::from_toml_str(&format!(
        r#"
        [dicomweb]
        url = "{}"

        [[destinations]]
        filter = "Modality=MR"
        url = "{}"

        [pipeline]
        conduit_capacity = 2
        routing_prefix_limit = 65536

        [redaction]
        replace = {{ PatientName = "ANON" }}
        "#,
        default.prefix(),
        mr.prefix()
    ))
    .unwrap();

    let monitor = Arc::new(InMemoryMonitor::new());
    let service = bootstrap::build_store_service(
        &config,
        Handle::current(),
        monitor.clone() as Arc<dyn MonitoringService>,
    )
    .unwrap();

    let (request, dataset) = request("MODA", "1.2.3.400", "MR");
    let response = service.handle_store(request).await;
    assert!(response.status.is_success(), "{:?}", response);

    assert!(default.state.stores().is_empty());
    let object = mock_dicomweb::parse_part10(&mr.state.stores()[0].part());
    assert_eq!(mock_dicomweb::text(&object, tags::PATIENT_NAME).as_deref(), Some("ANON"));
    assert_eq!(monitor.values(Event::CStoreBytes), vec![dataset.len() as u64]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_redacted_upload_failure_reports_upstream_status() {
    let server = mock_dicomweb::start().await;
    let mut replace = BTreeMap::new();
    replace.insert("PatientName".to_string(), "ANON".to_string());
    let redactor = TagRedactor::new(&[], &replace).unwrap();

    let service = CStoreService::new(
        Arc::new(DestinationRouter::new(client(server.failing_prefix()))),
        Handle::current(),
    )
    .with_redactor(Arc::new(redactor));

    for i in 0..20 {
        let (request, _) = request("MODA", &format!("1.2.3.500.{i}"), "CT");
        let response = service.handle_store(request).await;

        assert_eq!(response.status.code(), status::PROCESSING_FAILURE);
        let comment = response.error_comment.unwrap_or_default();
        assert!(comment.contains("500"), "{comment}");
        assert!(comment.contains("internal error"), "{comment}");
    }
}

#[tokio::test]
async fn test_ae_title_filter_registered_first_wins_over_modality_filter() {
    let default = mock_dicomweb::start().await;
    let moda = mock_dicomweb::start().await;
    let ct = mock_dicomweb::start().await;

    let router = DestinationRouter::new(client(default.prefix()))
        .with_destination("AETitle=MODA".parse::<AttributeFilter>().unwrap(), client(moda.prefix()))
        .with_destination("Modality=CT".parse::<AttributeFilter>().unwrap(), client(ct.prefix()));
    let service = CStoreService::new(Arc::new(router), Handle::current());

    let (request, _) = request("MODA", "1.2.3.600", "MR");
    let response = service.handle_store(request).await;
    assert!(response.status.is_success(), "{:?}", response);

    assert_eq!(moda.state.stores().len(), 1);
    assert!(ct.state.stores().is_empty());
    assert!(default.state.stores().is_empty());
}

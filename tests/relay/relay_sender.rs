#[path = "../common/mock_dicomweb.rs"]
mod mock_dicomweb;

use std::sync::Arc;

use dicom_adapter::bootstrap;
use dicom_adapter::config::Config;
use dicom_adapter::dicomweb::{DicomWebClient, HttpDicomWebClient};
use dicom_adapter::monitoring::{Event, InMemoryMonitor, MonitoringService};
use dicom_adapter::relay::RelaySender;
use dimse::status;

fn client(prefix: String) -> Arc<dyn DicomWebClient> {
    Arc::new(HttpDicomWebClient::new(reqwest::Client::new(), prefix))
}

#[tokio::test]
async fn test_relay_moves_every_byte() {
    let source = mock_dicomweb::start().await;
    let sink = mock_dicomweb::start().await;
    let payload: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    source.state.put_object("big", payload.clone());

    let monitor = Arc::new(InMemoryMonitor::new());
    let relay = RelaySender::new(client(source.prefix()), client(sink.prefix()))
        .with_monitor(monitor.clone() as Arc<dyn MonitoringService>);

    let moved = relay.send("objects/big").await.unwrap();
    assert_eq!(moved, payload.len() as u64);

    let stores = sink.state.stores();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].part(), payload);
    assert_eq!(monitor.values(Event::RelayBytes), vec![payload.len() as u64]);
}

#[tokio::test]
async fn test_source_failure_is_returned_unchanged() {
    let source = mock_dicomweb::start().await;
    let sink = mock_dicomweb::start().await;
    let monitor = Arc::new(InMemoryMonitor::new());
    let relay = RelaySender::new(client(source.prefix()), client(sink.prefix()))
        .with_monitor(monitor.clone() as Arc<dyn MonitoringService>);

    let err = relay.send("objects/missing").await.unwrap_err();
    assert_eq!(err.http_status, Some(404));
    assert_eq!(err.dicom_status, status::PROCESSING_FAILURE);
    assert!(err.message.starts_with("WadoRs"), "{}", err.message);

    assert_eq!(sink.state.hits(), 0);
    assert_eq!(monitor.count(Event::RelayError), 1);
}

#[tokio::test]
async fn test_sink_failure_is_returned_unchanged() {
    let source = mock_dicomweb::start().await;
    source.state.put_object("a", vec![1, 2, 3]);
    let relay = RelaySender::new(client(source.prefix()), client(source.failing_prefix()));

    let err = relay.send("objects/a").await.unwrap_err();
    assert_eq!(err.http_status, Some(500));
    assert!(err.message.starts_with("StowRs"), "{}", err.message);
}

#[tokio::test]
async fn test_relay_built_from_config() {
    let source = mock_dicomweb::start().await;
    let sink = mock_dicomweb::start().await;
    source.state.put_object("a", b"abc".to_vec());

    let config = Config::from_toml_str(&format!(
        "[dicomweb]\nurl = \"{}\"\n[relay]\nsource = \"{}\"\nsink = \"{}\"\n",
        sink.prefix(),
        source.prefix(),
        sink.prefix()
    ))
    .unwrap();
    let relay = bootstrap::build_relay(&config, Arc::new(InMemoryMonitor::new())).unwrap();

    assert_eq!(relay.send("objects/a").await.unwrap(), 3);
    assert_eq!(sink.state.stores()[0].part(), b"abc");
}

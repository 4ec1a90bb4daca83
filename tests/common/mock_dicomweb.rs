//! In-process DICOMweb origin used by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_encoding::transfer_syntax::TransferSyntaxIndex;
use dicom_object::InMemDicomObject;
use dicom_transfer_syntax_registry::TransferSyntaxRegistry;
use serde_json::json;
use tokio::net::TcpListener;

/// One STOW-RS request as the server received it
#[derive(Debug, Clone)]
pub struct StoredRequest {
    pub content_type: String,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

impl StoredRequest {
    /// Payload of the single `application/dicom` part.
    pub fn part(&self) -> Vec<u8> {
        single_part(&self.content_type, &self.body)
    }
}

#[derive(Clone, Default)]
pub struct MockState {
    stores: Arc<Mutex<Vec<StoredRequest>>>,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    hits: Arc<Mutex<usize>>,
}

impl MockState {
    pub fn stores(&self) -> Vec<StoredRequest> {
        self.stores.lock().unwrap().clone()
    }

    /// Total requests seen, any route
    pub fn hits(&self) -> usize {
        *self.hits.lock().unwrap()
    }

    pub fn put_object(&self, name: &str, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(name.to_string(), bytes);
    }

    fn hit(&self) {
        *self.hits.lock().unwrap() += 1;
    }
}

/// A running mock server and the service prefixes it answers on.
///
/// - `{base}/dicom-web` behaves like a healthy origin
/// - `{base}/failing` answers every store with 500 "internal error"
pub struct MockDicomWeb {
    pub base_url: String,
    pub state: MockState,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockDicomWeb {
    pub fn prefix(&self) -> String {
        format!("{}/dicom-web", self.base_url)
    }

    pub fn failing_prefix(&self) -> String {
        format!("{}/failing", self.base_url)
    }
}

pub async fn start() -> MockDicomWeb {
    let state = MockState::default();
    let app = Router::new()
        .route("/dicom-web/studies", post(store).get(query_studies))
        .route("/dicom-web/empty", get(query_empty))
        .route("/dicom-web/objects/{name}", get(retrieve))
        .route("/failing/studies", post(store_failing))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockDicomWeb {
        base_url: format!("http://{}", addr),
        state,
        _handle: handle,
    }
}

async fn store(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    state.hit();
    let request = StoredRequest {
        content_type: header_text(&headers, header::CONTENT_TYPE).unwrap_or_default(),
        authorization: header_text(&headers, header::AUTHORIZATION),
        body: body.to_vec(),
    };
    let part = request.part();
    if let Some(uid) = sop_instance_uid(&part) {
        state.objects.lock().unwrap().insert(uid, part);
    }
    state.stores.lock().unwrap().push(request);
    (StatusCode::OK, axum::Json(json!({})))
}

async fn store_failing(State(state): State<MockState>, _body: Bytes) -> impl IntoResponse {
    state.hit();
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

async fn query_studies(State(state): State<MockState>) -> impl IntoResponse {
    state.hit();
    axum::Json(json!([
        { "0020000D": { "vr": "UI", "Value": ["1.2.3"] } },
        { "0020000D": { "vr": "UI", "Value": ["1.2.4"] } }
    ]))
}

async fn query_empty(State(state): State<MockState>) -> StatusCode {
    state.hit();
    StatusCode::NO_CONTENT
}

async fn retrieve(State(state): State<MockState>, Path(name): Path<String>) -> impl IntoResponse {
    state.hit();
    let found = state.objects.lock().unwrap().get(&name).cloned();
    match found {
        Some(bytes) => (StatusCode::OK, bytes).into_response(),
        None => (StatusCode::NOT_FOUND, "no such object").into_response(),
    }
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Cut the payload out of a one-part `multipart/related` body.
pub fn single_part(content_type: &str, body: &[u8]) -> Vec<u8> {
    let boundary = content_type
        .split(';')
        .filter_map(|p| p.trim().strip_prefix("boundary="))
        .next()
        .expect("content type carries a boundary");
    let closing = format!("\r\n--{}--", boundary);

    let start = find(body, b"\r\n\r\n").expect("part headers are terminated") + 4;
    let end = find(body, closing.as_bytes()).expect("closing delimiter present");
    assert!(body.ends_with(closing.as_bytes()));
    body[start..end].to_vec()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn sop_instance_uid(part10: &[u8]) -> Option<String> {
    let object = dicom_object::from_reader(part10.get(128..)?).ok()?;
    Some(
        object
            .meta()
            .media_storage_sop_instance_uid()
            .trim_end_matches('\0')
            .to_string(),
    )
}

/// A small explicit VR little endian data set.
pub fn dataset(sop_instance_uid: &str, modality: &str) -> InMemDicomObject {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    ));
    obj.put(DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(sop_instance_uid)));
    obj.put(DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^Jane")));
    obj.put(DataElement::new(tags::PATIENT_BIRTH_DATE, VR::DA, PrimitiveValue::from("19700101")));
    obj.put(DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from(modality)));
    obj.put(DataElement::new(tags::PIXEL_DATA, VR::OB, PrimitiveValue::from(vec![7u8; 4096])));
    obj
}

pub fn dataset_bytes(obj: &InMemDicomObject) -> Vec<u8> {
    let ts = TransferSyntaxRegistry.get(uids::EXPLICIT_VR_LITTLE_ENDIAN).unwrap();
    let mut out = Vec::new();
    obj.write_dataset_with_ts(&mut out, ts).unwrap();
    out
}

/// The C-STORE-RQ command set for `sop_instance_uid`.
pub fn command(sop_instance_uid: &str) -> InMemDicomObject {
    let mut cmd = InMemDicomObject::new_empty();
    cmd.put(DataElement::new(
        tags::AFFECTED_SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    ));
    cmd.put(DataElement::new(
        tags::AFFECTED_SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(sop_instance_uid),
    ));
    cmd.put(DataElement::new(tags::MESSAGE_ID, VR::US, PrimitiveValue::from(1_u16)));
    cmd
}

/// Parse a stored Part-10 payload back into an object.
pub fn parse_part10(part10: &[u8]) -> dicom_object::DefaultDicomObject {
    assert_eq!(&part10[128..132], b"DICM");
    dicom_object::from_reader(&part10[128..]).unwrap()
}

pub fn text(obj: &InMemDicomObject, tag: dicom_core::Tag) -> Option<String> {
    obj.element(tag)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|s| s.trim_matches(|c: char| c == '\0' || c == ' ').to_string())
}

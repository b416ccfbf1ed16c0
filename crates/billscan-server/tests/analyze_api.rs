//! End-to-end tests for the upload endpoint.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use billscan_core::{ExtractedItems, ExtractionConfig, ExtractionResult};
use billscan_extractors::{Extractor, VisionInvoiceExtractor};
use billscan_server::{create_server, AppState};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "billscan-test-boundary";
const PNG_BYTES: [u8; 12] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
];
const PATH: &str = "/openai/deployments/gpt-4o/chat/completions";

/// Records what it saw so tests can check the transient file.
struct RecordingExtractor {
    seen: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    result: ExtractionResult,
}

impl RecordingExtractor {
    fn returning(result: ExtractionResult) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            result,
        })
    }
}

#[async_trait]
impl Extractor for RecordingExtractor {
    async fn extract(&self, path: &Path) -> ExtractionResult {
        let content = std::fs::read(path).unwrap_or_default();
        self.seen.lock().unwrap().push((path.to_path_buf(), content));
        self.result.clone()
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// A `file` part sent as a plain form value, with no filename.
fn form_value_body(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"\r\n\r\n{v}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = field,
        v = value
    )
    .into_bytes()
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn upload_dir_is_empty(dir: &Path) -> bool {
    !dir.exists() || std::fs::read_dir(dir).unwrap().next().is_none()
}

fn vision_app(base_url: &str, upload_dir: &Path) -> Router {
    let config = ExtractionConfig::new(base_url, "gpt-4o", "test-key");
    let extractor = VisionInvoiceExtractor::new(config).unwrap();
    create_server(AppState::new(Arc::new(extractor), upload_dir))
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let extractor = RecordingExtractor::returning(ExtractionResult::Items(
        ExtractedItems::Structured(json!([])),
    ));
    let app = create_server(AppState::new(extractor.clone(), tmp.path().join("uploads")));

    let (status, body) = send(app, upload_request(multipart_body("document", "a.png", b"x"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No file uploaded"}));
    assert!(extractor.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_file_field_without_filename_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let upload_dir = tmp.path().join("uploads");
    let extractor = RecordingExtractor::returning(ExtractionResult::Items(
        ExtractedItems::Structured(json!([])),
    ));
    let app = create_server(AppState::new(extractor.clone(), &upload_dir));

    let (status, body) = send(app, upload_request(form_value_body("file", "hello"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No file uploaded"}));
    assert!(extractor.seen.lock().unwrap().is_empty());
    assert!(upload_dir_is_empty(&upload_dir));
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let extractor = RecordingExtractor::returning(ExtractionResult::Items(
        ExtractedItems::Structured(json!([])),
    ));
    let app = create_server(AppState::new(extractor, tmp.path()));

    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No file uploaded"}));
}

#[tokio::test]
async fn test_upload_is_stored_under_opaque_name_and_removed() {
    let tmp = TempDir::new().unwrap();
    let upload_dir = tmp.path().join("uploads");
    let extractor = RecordingExtractor::returning(ExtractionResult::Items(
        ExtractedItems::RawText("no items found".to_string()),
    ));
    let app = create_server(AppState::new(extractor.clone(), &upload_dir));

    let (status, body) = send(
        app,
        upload_request(multipart_body("file", "../escape.png", &PNG_BYTES)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"items": [{"info": "no items found"}]}));

    let seen = extractor.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (path, content) = &seen[0];
    assert_eq!(path.parent(), Some(upload_dir.as_path()));
    assert_ne!(path.file_name().unwrap(), "escape.png");
    assert_eq!(content, &PNG_BYTES.to_vec());

    assert!(!path.exists());
    assert!(!tmp.path().join("escape.png").exists());
    assert!(upload_dir_is_empty(&upload_dir));
}

#[tokio::test]
async fn test_extraction_error_keeps_status_200() {
    let tmp = TempDir::new().unwrap();
    let extractor = RecordingExtractor::returning(ExtractionResult::Failed {
        kind: billscan_core::ErrorKind::RemoteCall,
        message: "Error: Unauthorized".to_string(),
    });
    let app = create_server(AppState::new(extractor, tmp.path()));

    let (status, body) = send(app, upload_request(multipart_body("file", "a.png", &PNG_BYTES))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Error: Unauthorized"}));
    assert!(upload_dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_structured_items_from_remote_model() {
    let mut server = Server::new_async().await;
    let items = json!([
        {"item": "A4 paper", "quantity": 10},
        {"address": "221B Baker Street, London", "latitude": 51.5238, "longitude": -0.1586}
    ]);
    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::UrlEncoded("api-version".into(), "2023-05-15".into()))
        .match_header("api-key", "test-key")
        .match_body(Matcher::Regex("data:image/png;base64,iVBORw0KGgoAAAAN".into()))
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"content": items.to_string()}}]}).to_string(),
        )
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let upload_dir = tmp.path().join("uploads");
    let app = vision_app(&server.url(), &upload_dir);

    let (status, body) = send(app, upload_request(multipart_body("file", "inv.png", &PNG_BYTES))).await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "items": items }));
    assert!(upload_dir_is_empty(&upload_dir));
}

#[tokio::test]
async fn test_remote_failure_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let app = vision_app(&server.url(), tmp.path());

    let (status, body) = send(app, upload_request(multipart_body("file", "inv.png", &PNG_BYTES))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "Error: Internal Server Error"}));
    assert!(upload_dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_transport_failure_still_removes_upload() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tmp = TempDir::new().unwrap();
    let app = vision_app(&format!("http://{}/", addr), tmp.path());

    let (status, body) = send(app, upload_request(multipart_body("file", "inv.png", &PNG_BYTES))).await;

    assert_eq!(status, StatusCode::OK);
    let message = body["error"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(body.get("items").is_none());
    assert!(upload_dir_is_empty(tmp.path()));
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let extractor = RecordingExtractor::returning(ExtractionResult::Items(
        ExtractedItems::Structured(json!([])),
    ));
    let app = create_server(AppState::new(extractor, tmp.path()));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["extractor"], "recording");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let tmp = TempDir::new().unwrap();
    let extractor = RecordingExtractor::returning(ExtractionResult::Items(
        ExtractedItems::Structured(json!([])),
    ));
    let app = create_server(AppState::new(extractor, tmp.path()));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

//! Integration tests for requestable
//!
//! These tests use wiremock to simulate HTTP servers and drive data, download
//! and upload operations end to end.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use requestable::{
    Auth, DataRequestable, Destination, DestinationOptions, Downloadable, Error,
    OperationState, ParameterEncoding, Parameters, Requestable, ResumeData, Session,
    UploadSource, Uploadable, Validator, suggested_download_destination, to_file,
};
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a session pointed at the mock server
fn session(server: &MockServer, start: bool) -> Session {
    Session::builder()
        .base_url(server.uri())
        .user_agent("requestable-integration-test/1.0")
        .start_requests_immediately(start)
        .build()
        .expect("Failed to build session")
}

/// A generic endpoint whose request shape is set per test
struct Endpoint {
    session: Session,
    method: Method,
    path: String,
    parameters: Option<Parameters>,
    encoding: ParameterEncoding,
    credentials: Option<Auth>,
    resume_data: Option<Bytes>,
    destination: Option<Destination>,
    validate: bool,
}

impl Endpoint {
    fn new(session: Session, path: &str) -> Self {
        Self {
            session,
            method: Method::GET,
            path: path.to_string(),
            parameters: None,
            encoding: ParameterEncoding::default(),
            credentials: None,
            resume_data: None,
            destination: None,
            validate: true,
        }
    }
}

impl Requestable for Endpoint {
    fn session(&self) -> &Session {
        &self.session
    }

    fn path(&self) -> Option<String> {
        Some(self.path.clone())
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn parameters(&self) -> Option<Parameters> {
        self.parameters.clone()
    }

    fn encoding(&self) -> ParameterEncoding {
        self.encoding
    }

    fn credentials(&self) -> Option<Auth> {
        self.credentials.clone()
    }
}

impl DataRequestable for Endpoint {
    fn validation_block(&self) -> Option<Validator> {
        self.validate
            .then(|| self.validation().data_validation())
    }
}

impl Downloadable for Endpoint {
    fn resume_data(&self) -> Option<Bytes> {
        self.resume_data.clone()
    }

    fn destination(&self) -> Option<Destination> {
        self.destination.clone()
    }

    fn validation_block(&self) -> Option<Validator> {
        self.validate
            .then(|| self.validation().download_validation())
    }
}

impl Uploadable for Endpoint {
    fn upload_source(&self) -> UploadSource {
        UploadSource::Data(Bytes::from_static(b"payload"))
    }
}

// =============================================================================
// Data Tests
// =============================================================================

#[derive(Debug, Deserialize, PartialEq)]
struct Query {
    name: String,
    page: String,
}

#[tokio::test]
async fn test_get_decodes_args_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("name", "rust"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "args": { "name": "rust", "page": "2" },
            "url": "http://localhost/get?name=rust&page=2"
        })))
        .mount(&server)
        .await;

    let mut endpoint = Endpoint::new(session(&server, true), "get");
    endpoint.parameters = json!({ "name": "rust", "page": 2 }).as_object().cloned();

    let response = DataRequestable::as_request(&endpoint)
        .expect("Failed to build request")
        .response()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let args = response.args::<Query>().expect("Missing args envelope");
    assert_eq!(
        args.into_inner(),
        Query {
            name: "rust".into(),
            page: "2".into()
        }
    );
}

#[tokio::test]
async fn test_post_json_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(json!({ "user": "alice" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut endpoint = Endpoint::new(session(&server, true), "v1/login");
    endpoint.method = Method::POST;
    endpoint.encoding = ParameterEncoding::Json;
    endpoint.parameters = json!({ "user": "alice" }).as_object().cloned();
    endpoint.credentials = Some(Auth::bearer("secret"));

    let response = DataRequestable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_data_validation_rejects_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(session(&server, true), "missing");
    let result = DataRequestable::as_request(&endpoint)
        .unwrap()
        .response()
        .await;
    assert!(matches!(result, Err(Error::Validation { status: 404, .. })));

    let mut unvalidated = Endpoint::new(session(&server, true), "missing");
    unvalidated.validate = false;
    let response = DataRequestable::as_request(&unvalidated)
        .unwrap()
        .response()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.text().unwrap(), "not found");
}

#[tokio::test]
async fn test_idle_operation_waits_for_resume() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(session(&server, false), "get");
    let operation = DataRequestable::as_request(&endpoint).unwrap();
    assert_eq!(operation.state(), OperationState::Idle);
    assert!(matches!(operation.response().await, Err(Error::NotStarted)));

    assert!(operation.resume());
    let response = operation.response().await.unwrap();
    assert_eq!(response.bytes().as_ref(), b"ok");
    assert_eq!(operation.state(), OperationState::Completed);
}

// =============================================================================
// Download Tests
// =============================================================================

#[tokio::test]
async fn test_download_to_suggested_destination() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let server = MockServer::start().await;
    let test_content = b"id,name\n1,rust\n";

    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"report.csv\"")
                .set_body_raw(test_content.to_vec(), "text/csv"),
        )
        .mount(&server)
        .await;

    let mut endpoint = Endpoint::new(session(&server, false), "export");
    endpoint.destination = Some(suggested_download_destination(
        temp_dir.path().join("nested"),
        DestinationOptions::CREATE_INTERMEDIATE_DIRECTORIES,
    ));

    let operation = Downloadable::as_request(&endpoint).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    operation.on_progress(move |written, total| {
        recorder.lock().unwrap().push((written, total));
    });
    operation.resume();

    let response = operation.response().await.expect("Download failed");
    let expected_path = temp_dir.path().join("nested").join("report.csv");
    assert_eq!(response.file_path, expected_path);
    assert_eq!(response.bytes_downloaded, test_content.len() as u64);
    assert_eq!(std::fs::read(&expected_path).unwrap(), test_content);

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.last().copied(),
        Some((test_content.len() as u64, Some(test_content.len() as u64)))
    );
}

#[tokio::test]
async fn test_download_without_destination_stays_in_temp_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(session(&server, true), "file.bin");
    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();

    assert!(response.file_path.exists());
    assert_eq!(std::fs::read(&response.file_path).unwrap(), vec![1u8, 2, 3]);
    std::fs::remove_file(&response.file_path).unwrap();
}

#[tokio::test]
async fn test_download_validation_failure_removes_file() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410).set_body_string("gone"))
        .mount(&server)
        .await;

    let target = temp_dir.path().join("gone.txt");
    let mut endpoint = Endpoint::new(session(&server, true), "gone");
    endpoint.destination = Some(to_file(&target, DestinationOptions::NONE));

    let operation = Downloadable::as_request(&endpoint).unwrap();
    let result = operation.response().await;
    assert!(matches!(result, Err(Error::Validation { status: 410, .. })));
    assert!(!target.exists());
    assert!(operation.resume_data().is_none());

    endpoint.validate = false;
    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();
    assert_eq!(response.meta.status(), 410);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "gone");
}

fn partial_file(temp_dir: &TempDir, content: &[u8]) -> PathBuf {
    let partial = temp_dir.path().join("partial.download");
    std::fs::write(&partial, content).unwrap();
    partial
}

fn resume_data(server: &MockServer, partial: PathBuf, etag: Option<&str>) -> Bytes {
    ResumeData {
        url: format!("{}/resume.txt", server.uri()),
        offset: std::fs::metadata(&partial).unwrap().len(),
        path: partial,
        etag: etag.map(str::to_string),
    }
    .to_bytes()
    .unwrap()
}

#[tokio::test]
async fn test_resume_appends_partial_content() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resume.txt"))
        .and(header("range", "bytes=5-"))
        .and(header("if-range", "\"v1\""))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 5-10/11")
                .insert_header("ETag", "\"v1\"")
                .set_body_bytes(b" world".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let partial = partial_file(&temp_dir, b"hello");
    let target = temp_dir.path().join("hello.txt");
    let mut endpoint = Endpoint::new(session(&server, true), "resume.txt");
    endpoint.resume_data = Some(resume_data(&server, partial.clone(), Some("\"v1\"")));
    endpoint.destination = Some(to_file(&target, DestinationOptions::NONE));

    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .expect("Resume failed");

    assert_eq!(response.bytes_downloaded, 11);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello world");
    assert!(!partial.exists());
}

#[tokio::test]
async fn test_resume_restarts_when_range_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resume.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh content".to_vec()))
        .mount(&server)
        .await;

    let partial = partial_file(&temp_dir, b"stale");
    let mut endpoint = Endpoint::new(session(&server, true), "resume.txt");
    endpoint.resume_data = Some(resume_data(&server, partial.clone(), None));

    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.file_path, partial);
    assert_eq!(response.bytes_downloaded, 13);
    assert_eq!(std::fs::read_to_string(&partial).unwrap(), "fresh content");
}

#[tokio::test]
async fn test_resume_of_complete_file() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resume.txt"))
        .and(header("range", "bytes=11-"))
        .respond_with(ResponseTemplate::new(416).insert_header("Content-Range", "bytes */11"))
        .mount(&server)
        .await;

    let partial = partial_file(&temp_dir, b"hello world");
    let mut endpoint = Endpoint::new(session(&server, true), "resume.txt");
    endpoint.resume_data = Some(resume_data(&server, partial.clone(), None));

    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.bytes_downloaded, 11);
    assert_eq!(std::fs::read_to_string(&partial).unwrap(), "hello world");
}

#[tokio::test]
async fn test_resume_restarts_when_remote_length_differs() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resume.txt"))
        .and(header("range", "bytes=11-"))
        .respond_with(ResponseTemplate::new(416).insert_header("Content-Range", "bytes */4"))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/resume.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new!".to_vec()))
        .mount(&server)
        .await;

    let partial = partial_file(&temp_dir, b"hello world");
    let mut endpoint = Endpoint::new(session(&server, true), "resume.txt");
    endpoint.resume_data = Some(resume_data(&server, partial.clone(), None));

    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.meta.status(), 200);
    assert_eq!(response.bytes_downloaded, 4);
    assert_eq!(std::fs::read_to_string(&partial).unwrap(), "new!");
}

#[tokio::test]
async fn test_resume_data_for_other_url_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/other.bin"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"OTHER".to_vec()))
        .mount(&server)
        .await;

    // Recorded for /resume.txt, handed to a download of /other.bin
    let partial = partial_file(&temp_dir, b"hello");
    let mut endpoint = Endpoint::new(session(&server, true), "other.bin");
    endpoint.resume_data = Some(resume_data(&server, partial.clone(), None));

    let response = Downloadable::as_request(&endpoint)
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_ne!(response.file_path, partial);
    assert_eq!(response.bytes_downloaded, 5);
    assert_eq!(std::fs::read_to_string(&response.file_path).unwrap(), "OTHER");
    assert_eq!(std::fs::read_to_string(&partial).unwrap(), "hello");
    std::fs::remove_file(&response.file_path).unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|request| !request.headers.contains_key("range")));
}

#[tokio::test]
async fn test_cancel_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 16])
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(session(&server, true), "slow");
    let operation = Downloadable::as_request(&endpoint).unwrap();
    assert!(operation.is_started());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(operation.cancel());

    let result = tokio::time::timeout(Duration::from_secs(5), operation.response())
        .await
        .expect("Cancelled operation should finish promptly");
    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(operation.state(), OperationState::Cancelled);
    assert!(!operation.resume());
}

// =============================================================================
// Upload Tests
// =============================================================================

#[tokio::test]
async fn test_upload_data_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .and(header("content-type", "application/octet-stream"))
        .and(body_bytes(b"payload".to_vec()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "stored": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let mut endpoint = Endpoint::new(session(&server, false), "upload");
    endpoint.method = Method::PUT;

    let operation = Uploadable::as_request(&endpoint).unwrap();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let recorder = sent.clone();
    operation.on_progress(move |bytes, total| {
        recorder.lock().unwrap().push((bytes, total));
    });
    operation.resume();

    let response = operation.response().await.expect("Upload failed");
    assert_eq!(response.status(), 201);
    assert_eq!(sent.lock().unwrap().last().copied(), Some((7, Some(7))));
}

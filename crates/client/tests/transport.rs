use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use client::{ApiClient, ClientConfig, ClientError, PdfSource, SourceApi};
use serde_json::{Value, json};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone)]
struct Captured {
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

type Log = Arc<Mutex<Vec<Captured>>>;

fn capture(log: &Log, path: &str, headers: &HeaderMap, body: &[u8]) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    log.lock().unwrap().push(Captured {
        path: path.to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: body.to_vec(),
    });
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Fake platform API. Uploads are signed to `upload_base`, a second server.
async fn fake_api(log: Log, upload_base: String) -> String {
    let app = Router::new()
        .route(
            "/v1/project/:id",
            get(|State(log): State<Log>, headers: HeaderMap| async move {
                capture(&log, "/v1/project", &headers, b"");
                Json(json!({ "name": "demo" }))
            }),
        )
        .route(
            "/v1/source/text",
            post(|State(log): State<Log>, headers: HeaderMap, body: Bytes| async move {
                capture(&log, "/v1/source/text", &headers, &body);
                StatusCode::CREATED
            }),
        )
        .route(
            "/v1/source/signed-url",
            post(move |State(log): State<Log>, headers: HeaderMap, body: Bytes| {
                let upload_base = upload_base.clone();
                async move {
                    capture(&log, "/v1/source/signed-url", &headers, &body);
                    Json(json!({ "url": format!("{}/bucket/doc.pdf?sig=abc", upload_base), "key": "uploads/doc.pdf" }))
                }
            }),
        )
        .route(
            "/v1/source/pdf",
            post(|State(log): State<Log>, headers: HeaderMap, body: Bytes| async move {
                capture(&log, "/v1/source/pdf", &headers, &body);
                StatusCode::CREATED
            }),
        )
        .route(
            "/v1/conflict",
            post(|| async { (StatusCode::CONFLICT, Json(json!({ "message": "Source already exists" }))) }),
        )
        .route(
            "/v1/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
        )
        .with_state(log);

    serve(app).await
}

async fn fake_bucket(log: Log) -> String {
    let app = Router::new()
        .route(
            "/bucket/doc.pdf",
            put(|State(log): State<Log>, headers: HeaderMap, body: Bytes| async move {
                capture(&log, "/bucket/doc.pdf", &headers, &body);
                StatusCode::OK
            }),
        )
        .with_state(log);

    serve(app).await
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

fn api_client(base: &str) -> ApiClient {
    ApiClient::new(&ClientConfig {
        api_url: base.to_string(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_sends_api_key() {
    let log = Log::default();
    let base = fake_api(log.clone(), "http://unused".to_string()).await;
    let project = api_client(&base).project("42");

    let info = project.info().await.unwrap();
    assert_eq!(info["name"], "demo");

    let captured = log.lock().unwrap();
    assert_eq!(captured[0].authorization.as_deref(), Some("Api-Key test-key"));
}

#[tokio::test]
async fn test_conflict_surfaces_status_and_message() {
    let base = fake_api(Log::default(), "http://unused".to_string()).await;
    let api = api_client(&base);

    let err = api.post("/v1/conflict", Some(&json!({})), None).await.unwrap_err();
    assert!(err.is_conflict());
    match err {
        ClientError::Api { message, path, .. } => {
            assert_eq!(message, "Source already exists");
            assert_eq!(path, "/v1/conflict");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_failed_request_logs_method_path_and_message() {
    let (logs, _guard) = capture_logs();
    let base = fake_api(Log::default(), "http://unused".to_string()).await;
    let api = api_client(&base);

    api.post("/v1/conflict", Some(&json!({})), None).await.unwrap_err();
    api.get::<Value>("/v1/broken", None, None).await.unwrap_err();

    let errors: Vec<_> = logs.lines().into_iter().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[0].contains("POST /v1/conflict failed with message: Source already exists"));
    assert!(errors[0].contains("status=409"));
    assert!(errors[1].contains("GET /v1/broken failed with message: Unknown Error"));
}

#[tokio::test]
async fn test_non_json_error_body_is_unknown_error() {
    let base = fake_api(Log::default(), "http://unused".to_string()).await;
    let api = api_client(&base);

    let err = api.get::<Value>("/v1/broken", None, None).await.unwrap_err();
    assert!(!err.is_conflict());
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    match err {
        ClientError::Api { message, .. } => assert_eq!(message, "Unknown Error"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_text_source_body() {
    let log = Log::default();
    let base = fake_api(log.clone(), "http://unused".to_string()).await;
    let project = api_client(&base).project("demo-project");

    project.create_text_source("a.txt", "hi", "d").await.unwrap();

    let captured = log.lock().unwrap();
    let body: Value = serde_json::from_slice(&captured[0].body).unwrap();
    assert_eq!(
        body,
        json!({
            "projectIdentifier": "demo-project",
            "directoryIdentifier": "d",
            "sourceName": "a.txt",
            "text": "hi"
        })
    );
}

#[tokio::test]
async fn test_create_pdf_source_uploads_without_api_key() {
    let api_log = Log::default();
    let bucket_log = Log::default();
    let bucket = fake_bucket(bucket_log.clone()).await;
    let base = fake_api(api_log.clone(), bucket).await;
    let project = api_client(&base).project("7");

    let dir = tempfile::tempdir().unwrap();
    let pdf_path = dir.path().join("doc.pdf");
    std::fs::write(&pdf_path, b"%PDF-1.4 fake").unwrap();

    let bounds = json!([{ "page": 1, "x": 0.5 }]);
    project
        .create_pdf_source(&PdfSource {
            path: pdf_path,
            name: "doc.pdf".to_string(),
            directory: "docs".to_string(),
            ocr: false,
            source_text: Some("fake".to_string()),
            text_bounds: Some(bounds.clone()),
        })
        .await
        .unwrap();

    let uploads = bucket_log.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].body, b"%PDF-1.4 fake");
    assert_eq!(uploads[0].content_type.as_deref(), Some("application/pdf"));
    assert!(uploads[0].authorization.is_none());

    let calls = api_log.lock().unwrap();
    let paths: Vec<_> = calls.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["/v1/source/signed-url", "/v1/source/pdf"]);

    let body: Value = serde_json::from_slice(&calls[1].body).unwrap();
    assert_eq!(body["fileKey"], "uploads/doc.pdf");
    assert_eq!(body["ocr"], false);
    assert_eq!(body["sourceText"], "fake");
    assert_eq!(body["textBounds"], bounds);
}

#[tokio::test]
async fn test_missing_pdf_payload_is_io_error() {
    let base = fake_api(Log::default(), "http://unused".to_string()).await;
    let project = api_client(&base).project("7");

    let err = project
        .create_pdf_source(&PdfSource {
            path: "/nonexistent/doc.pdf".into(),
            name: "doc.pdf".to_string(),
            directory: "docs".to_string(),
            ocr: false,
            source_text: None,
            text_bounds: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Io { .. }));
}

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use tether_api::{build_router, config::Config, AppState};
use tether_attachments::LocalAttachmentStore;
use tether_engine::{encode_sse, ChatEngine, StreamFrame};
use tether_llm::MockProvider;
use tether_persist::InMemoryPersistenceClient;

struct TestApp {
    router: Router,
    _uploads: tempfile::TempDir,
}

fn test_config(root: &Path, format: &str) -> Config {
    let toml = format!(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0

        [cors]
        enabled = false
        origins = ["*"]

        [providers]
        default_model = "gpt-4o-mini"
        mock_chunks = ["A", "B", "C"]
        openai_model = "gpt-4o-mini"
        openrouter_model = "openai/gpt-4o-mini"

        [storage]
        backend = "memory"
        database = "test"

        [attachments]
        local_root = "{}"

        [stream]
        format = "{}"

        [logging]
        level = "debug"
        format = "pretty"
        "#,
        root.display(),
        format
    );
    toml::from_str(&toml).unwrap()
}

fn app(format: &str) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = test_config(uploads.path(), format);

    let engine = ChatEngine::builder()
        .persistence(Arc::new(InMemoryPersistenceClient::new()))
        .attachments(Arc::new(LocalAttachmentStore::new(uploads.path())))
        .provider(Arc::new(MockProvider::new(["A", "B", "C"])))
        .config(config.engine.clone())
        .build()
        .unwrap();

    TestApp {
        router: build_router(Arc::new(AppState::new(config, engine))),
        _uploads: uploads,
    }
}

fn chat_body(thread_id: &str) -> Value {
    json!({
        "id": thread_id,
        "sessionId": "anon",
        "model": "mock",
        "message": {
            "id": "m1",
            "threadId": thread_id,
            "role": "user",
            "parts": [{ "type": "text", "text": "hello" }],
            "createdAt": "2025-01-01T00:00:00Z"
        }
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_chat_streams_ui_events() {
    let app = app("ui");

    let response = send(&app, post_json("/api/chat", &chat_body("thread-1"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("text/event-stream"));
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    assert_eq!(
        body_text(response).await,
        concat!(
            "data: {\"type\":\"text-start\",\"id\":\"thread-1\"}\n\n",
            "data: {\"type\":\"text-delta\",\"id\":\"thread-1\",\"delta\":\"A\"}\n\n",
            "data: {\"type\":\"text-delta\",\"id\":\"thread-1\",\"delta\":\"B\"}\n\n",
            "data: {\"type\":\"text-delta\",\"id\":\"thread-1\",\"delta\":\"C\"}\n\n",
            "data: {\"type\":\"text-end\",\"id\":\"thread-1\"}\n\n",
        )
    );
}

#[tokio::test]
async fn test_chat_streams_core_frames_bit_exact() {
    let app = app("core");

    let response = send(&app, post_json("/api/chat", &chat_body("t1"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let expected: String = [
        StreamFrame::Start { thread_id: "t1".to_string() },
        StreamFrame::delta("A"),
        StreamFrame::delta("B"),
        StreamFrame::delta("C"),
        StreamFrame::Done,
    ]
    .iter()
    .map(encode_sse)
    .collect();
    assert_eq!(body_text(response).await, expected);
}

#[tokio::test]
async fn test_chat_requires_thread_id() {
    let app = app("ui");
    let mut body = chat_body("t1");
    body["id"] = json!("");

    let response = send(&app, post_json("/api/chat", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid request: Invalid request payload" })
    );
}

#[tokio::test]
async fn test_chat_unknown_provider_is_bad_request() {
    let app = app("ui");
    let mut body = chat_body("t1");
    body["providerId"] = json!("nope");

    let response = send(&app, post_json("/api/chat", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Unknown provider: nope" }));
}

#[tokio::test]
async fn test_resume_replays_from_cursor() {
    let app = app("core");
    body_text(send(&app, post_json("/api/chat", &chat_body("t1"))).await).await;

    let response = send(&app, get("/api/chat/t1/stream?cursor=1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        concat!(
            "data: {\"type\":\"resume\",\"threadId\":\"t1\",\"cursor\":1}\n\n",
            "data: {\"type\":\"delta\",\"text\":\"B\"}\n\n",
            "data: {\"type\":\"delta\",\"text\":\"C\"}\n\n",
            "data: {\"type\":\"done\"}\n\n",
        )
    );
}

#[tokio::test]
async fn test_resume_accepts_post_and_bad_cursor() {
    let app = app("core");
    body_text(send(&app, post_json("/api/chat", &chat_body("t1"))).await).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat/t1/stream?cursor=abc")
        .body(Body::empty())
        .unwrap();
    let text = body_text(send(&app, request).await).await;

    assert!(text.starts_with("data: {\"type\":\"resume\",\"threadId\":\"t1\",\"cursor\":0}\n\n"));
    assert!(text.contains("\"text\":\"A\""));
    assert!(text.ends_with("data: {\"type\":\"done\"}\n\n"));
}

#[tokio::test]
async fn test_resume_without_stream_is_not_found() {
    let app = app("ui");

    let response = send(&app, get("/api/chat/missing/stream")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "No active stream" }));
}

#[tokio::test]
async fn test_json_attachment_upload_is_served_back() {
    let app = app("ui");
    let body = json!({
        "threadId": "t1",
        "messageId": "m1",
        "name": "doc.pdf",
        "mimeType": "application/pdf",
        "dataBase64": "JVBERi0xLjQ="
    });

    let response = send(&app, post_json("/api/chat/attachments", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let attachment = &json["attachment"];
    assert_eq!(attachment["mimeType"], json!("application/pdf"));
    assert_eq!(attachment["sizeBytes"], json!(8));
    assert_eq!(attachment["messageId"], json!("m1"));

    let url = attachment["url"].as_str().unwrap();
    assert!(url.starts_with("/local-attachments/t1/"));

    let response = send(&app, get(url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "%PDF-1.4");
}

#[tokio::test]
async fn test_attachment_validation_is_bad_request() {
    let app = app("ui");
    let body = json!({
        "threadId": "t1",
        "name": "notes.txt",
        "mimeType": "text/plain",
        "dataBase64": "aGk="
    });

    let response = send(&app, post_json("/api/chat/attachments", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Unsupported attachment mime type: text/plain" })
    );
}

#[tokio::test]
async fn test_attachment_bad_base64_is_bad_request() {
    let app = app("ui");
    let body = json!({
        "threadId": "t1",
        "name": "cat.png",
        "mimeType": "image/png",
        "dataBase64": "not base64!"
    });

    let response = send(&app, post_json("/api/chat/attachments", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_multipart_attachment_upload() {
    let app = app("ui");
    let body = concat!(
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"threadId\"\r\n\r\n",
        "t1\r\n",
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\n",
        "Content-Type: image/png\r\n\r\n",
        "PNGDATA\r\n",
        "--XBOUNDARY--\r\n",
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat/attachments")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["attachment"]["name"], json!("cat.png"));
    assert_eq!(json["attachment"]["threadId"], json!("t1"));
    assert_eq!(json["attachment"]["sizeBytes"], json!(7));
}

#[tokio::test]
async fn test_multipart_without_file_is_bad_request() {
    let app = app("ui");
    let body = concat!(
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"threadId\"\r\n\r\n",
        "t1\r\n",
        "--XBOUNDARY--\r\n",
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat/attachments")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid request: Invalid attachment payload" })
    );
}

#[tokio::test]
async fn test_retention_reports_deleted_count() {
    let app = app("ui");
    let request = Request::builder()
        .method("POST")
        .uri("/api/maintenance/retention")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "deleted": 0 }));
}

#[tokio::test]
async fn test_health_check() {
    let app = app("ui");

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], json!("healthy"));
    assert_eq!(json["providers"], json!(["mock"]));
    assert_eq!(json["liveStreams"], json!(0));
}

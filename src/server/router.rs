use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::core::config::ServerSettings;
use crate::server::handlers::{chat, embed, health};
use crate::state::AppState;

/// Creates the application router.
///
/// Routes: `/health`, `/api/status`, `/api/chat` and `/api/embed`, plus the
/// `/`, `/embed` and `/static` pages when `server.web_root` is set. Request
/// bodies are capped at `server.max_upload_bytes`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server);
    let body_limit = DefaultBodyLimit::max(state.settings.server.max_upload_bytes);
    let web_root = state.settings.server.web_root.clone();

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/api/chat", post(chat::chat))
        .route("/api/embed", post(embed::embed));

    if let Some(web_root) = web_root {
        tracing::info!("Serving browser UI from {}", web_root.display());
        app = app
            .route_service("/", ServeFile::new(web_root.join("index.html")))
            .route_service("/embed", ServeFile::new(web_root.join("embed.html")))
            .nest_service("/static", ServeDir::new(web_root.join("static")));
    }

    app.with_state(state)
        .layer(body_limit)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(server: &ServerSettings) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(&server.cors_allowed_origins)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }

    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5000".to_string(),
        "http://localhost:5173".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core::config::Settings;
    use crate::embedding::Embedder;
    use crate::llm::LlmProvider;
    use crate::rag::testing::{FailingLlm, FailingStore, FakeEmbedder, RecordingLlm};
    use crate::rag::{RagOptions, RagService, SqliteStore, VectorStore, EMPTY_QUERY_MESSAGE};

    const BOUNDARY: &str = "derma-test-boundary";

    struct TestApp {
        router: Router,
        store: Arc<dyn VectorStore>,
    }

    async fn app_with(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmProvider>,
        settings: Settings,
    ) -> TestApp {
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::default());
        let rag = RagService::new(embedder, store.clone(), llm, RagOptions::default());
        let state = AppState::new(settings, rag);
        TestApp {
            router: router(state),
            store,
        }
    }

    async fn sqlite_app(llm: Arc<dyn LlmProvider>) -> TestApp {
        let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        app_with(store, llm, Settings::default()).await
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// `(name, filename, bytes)` parts encoded as `multipart/form-data`.
    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, bytes) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/embed")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn chat_without_message_is_rejected() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        for body in ["{}", r#"{"message": ""}"#, "not json"] {
            let (status, response) = send(&app, json_request("/api/chat", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(response, json!({ "error": "No message provided" }));
        }
    }

    #[tokio::test]
    async fn blank_chat_message_gets_the_prompt_text_without_calling_the_llm() {
        let llm = Arc::new(RecordingLlm::new("unused"));
        let app = sqlite_app(llm.clone()).await;

        let (status, body) = send(&app, json_request("/api/chat", r#"{"message": "   "}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "response": EMPTY_QUERY_MESSAGE }));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn chat_answers_with_ingested_context() {
        let llm = Arc::new(RecordingLlm::new("ควรใช้ยาทาเบนซอยล์เปอร์ออกไซด์ค่ะ"));
        let app = sqlite_app(llm.clone()).await;
        let knowledge = "สิวอักเสบรักษาด้วยเบนซอยล์เปอร์ออกไซด์";

        let (status, _) = send(
            &app,
            json_request("/api/embed", &json!({ "text": knowledge }).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            json_request("/api/chat", &json!({ "message": knowledge }).to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "response": "ควรใช้ยาทาเบนซอยล์เปอร์ออกไซด์ค่ะ" }));
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[0]
            .content
            .contains(&format!("- {}", knowledge)));
        assert_eq!(requests[0].messages[1].content, knowledge);
    }

    #[tokio::test]
    async fn llm_failure_is_a_server_error() {
        let app = sqlite_app(Arc::new(FailingLlm)).await;

        let (status, body) = send(&app, json_request("/api/chat", r#"{"message": "ผื่น"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("bad gateway"));
    }

    #[tokio::test]
    async fn embed_json_reports_chunks_and_updates_status() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;
        let text = "บรรทัดที่หนึ่งเกี่ยวกับสิว\nบรรทัดที่สองเกี่ยวกับผื่น";

        let (status, body) = send(
            &app,
            json_request(
                "/api/embed",
                &json!({ "text": text, "chunk_size": 50, "chunk_overlap": 0 }).to_string(),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_chars"], json!(text.chars().count()));
        let added = body["chunks_added"].as_u64().unwrap();
        assert!(added >= 1);
        assert_eq!(
            body["message"],
            json!(format!("เพิ่ม {} chunks เข้าฐานข้อมูล SQLite สำเร็จ", added))
        );

        let request = Request::builder()
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "store": "SQLite",
                "documents": added,
                "embedding_model": "fake-embedder",
                "llm_model": "recording-llm",
            })
        );
    }

    #[tokio::test]
    async fn embed_json_without_text_is_rejected() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        for body in [r#"{"text": "  "}"#, r#"{"chunk_size": 100}"#, "[oops"] {
            let (status, response) = send(&app, json_request("/api/embed", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(response, json!({ "error": "ไม่พบข้อความในคำขอ" }));
        }
        assert_eq!(app.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embed_tis620_text_upload() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;
        // "สิว" in TIS-620
        let bytes: &[u8] = &[0xCA, 0xD4, 0xC7];

        let (status, body) = send(
            &app,
            multipart_request(&[
                ("file", Some("notes.TXT"), bytes),
                ("chunk_size", None, b"200".as_slice()),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chunks_added"], json!(1));
        assert_eq!(body["total_chars"], json!(3));

        let query = FakeEmbedder::default().vector_for("สิว");
        let matches = app.store.match_chunks(&query, 4, 0.5).await.unwrap();
        assert_eq!(matches[0].content, "สิว");
        let metadata = matches[0].metadata.clone().unwrap();
        assert_eq!(metadata["filename"], json!("notes.TXT"));
        assert_eq!(metadata["chunk_size"], json!(200));
    }

    #[tokio::test]
    async fn unsupported_upload_is_rejected_without_touching_the_store() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        let (status, body) = send(
            &app,
            multipart_request(&[("file", Some("paper.pdf"), b"%PDF-1.7".as_slice())]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "รองรับเฉพาะไฟล์ .txt และ .docx เท่านั้น" }));
        assert_eq!(app.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn multipart_without_file_is_rejected() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        let (status, body) =
            send(&app, multipart_request(&[("chunk_size", None, b"300".as_slice())])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "ไม่พบไฟล์ในคำขอ" }));
    }

    #[tokio::test]
    async fn non_integer_chunk_size_is_rejected() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        let (status, body) = send(
            &app,
            multipart_request(&[
                ("file", Some("notes.txt"), "สิว".as_bytes()),
                ("chunk_size", None, b"large".as_slice()),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("chunk_size"));
        assert_eq!(app.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn broken_docx_is_a_client_error() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        let (status, body) = send(
            &app,
            multipart_request(&[("file", Some("notes.docx"), b"not a zip archive".as_slice())]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("ไม่สามารถอ่านไฟล์ได้: "));
    }

    #[tokio::test]
    async fn oversized_body_gets_413() {
        let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let mut settings = Settings::default();
        settings.server.max_upload_bytes = 64;
        let app = app_with(store, Arc::new(RecordingLlm::new("ok")), settings).await;

        let text = "ก".repeat(200);
        let (status, _) = send(
            &app,
            json_request("/api/embed", &json!({ "text": text }).to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(app.store.count().await.unwrap(), 0);
    }

    async fn get_text(app: &TestApp, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn web_root_serves_pages_and_static_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>DermaAI</h1>").unwrap();
        std::fs::write(dir.path().join("embed.html"), "<h1>Embed</h1>").unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/script.js"), "fetch('/api/chat')").unwrap();

        let store: Arc<dyn VectorStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let mut settings = Settings::default();
        settings.server.web_root = Some(dir.path().to_path_buf());
        let app = app_with(store, Arc::new(RecordingLlm::new("ok")), settings).await;

        assert_eq!(
            get_text(&app, "/").await,
            (StatusCode::OK, "<h1>DermaAI</h1>".to_string())
        );
        assert_eq!(
            get_text(&app, "/embed").await,
            (StatusCode::OK, "<h1>Embed</h1>".to_string())
        );
        assert_eq!(
            get_text(&app, "/static/script.js").await,
            (StatusCode::OK, "fetch('/api/chat')".to_string())
        );
        assert_eq!(
            get_text(&app, "/static/missing.js").await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn pages_are_not_served_without_web_root() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;

        assert_eq!(get_text(&app, "/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_text(&app, "/embed").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_reports_null_documents_when_store_is_down() {
        let app = app_with(
            Arc::new(FailingStore),
            Arc::new(RecordingLlm::new("ok")),
            Settings::default(),
        )
        .await;
        let request = Request::builder()
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"], json!("Failing"));
        assert_eq!(body["documents"], Value::Null);
    }

    #[tokio::test]
    async fn cors_allows_local_dev_origins() {
        let app = sqlite_app(Arc::new(RecordingLlm::new("ok"))).await;
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
    }

    #[test]
    fn configured_origins_replace_the_defaults() {
        let configured = [" https://derma.example ".to_string(), "".to_string()];
        let origins = resolve_allowed_origins(&configured);
        assert_eq!(origins, vec!["https://derma.example".to_string()]);
        assert_eq!(resolve_allowed_origins(&[]), default_local_origins());
    }
}

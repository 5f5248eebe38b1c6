//! # docchat: Document Question-Answering Service
//!
//! `docchat` is a self-contained web service for asking questions about uploaded
//! documents. A user uploads a PDF, DOCX, TXT, CSV, or Markdown file; the service
//! extracts its text, packs it into retrieval-sized chunks, embeds each chunk, and
//! answers questions by sending the most relevant chunks to an OpenAI-compatible
//! chat-completion API as grounding context.
//!
//! ## Overview
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum). All state
//! is held in memory: the document index lives in a concurrent map for the lifetime
//! of the process, while raw uploads are kept on disk under the configured uploads
//! directory. There is no database.
//!
//! ### Request Flow
//!
//! `POST /upload-document/` streams a multipart upload to disk with an incremental
//! size check, extracts its text on a blocking thread, chunks and embeds it, and
//! registers the result in the [`store`]. `POST /ask-question/` embeds the question
//! with the same provider, ranks the document's chunks by cosine similarity
//! ([`retrieval`]), and asks the configured chat model ([`llm`]) for an answer
//! grounded in the top chunks.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the upload, chat, settings, and document
//! management endpoints, plus embedded frontend assets: a dashboard page, an
//! embeddable chat widget (`/widget.js`), and a demo page hosting it.
//!
//! The **embedding layer** ([`embedder`]) is a provider seam: a remote
//! OpenAI-compatible `/embeddings` endpoint or a built-in lexical vectorizer for
//! offline operation.
//!
//! **Background services** currently consist of an optional retention sweeper that
//! evicts documents past a configured age and deletes their files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use docchat::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = docchat::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging and optional OpenTelemetry)
//!     docchat::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod embedder;
pub mod errors;
pub mod ingest;
pub mod llm;
mod openapi;
pub mod retrieval;
mod static_assets;
pub mod store;
pub mod telemetry;
pub mod types;

use crate::embedder::Embedder;
use crate::llm::ChatClient;
use crate::openapi::ApiDoc;
use crate::store::DocumentStore;
use arc_swap::ArcSwapOption;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::CorsOrigin;

pub use types::DocumentId;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from file/environment
/// - `store`: In-memory document index
/// - `embedder`: Active embedding provider
/// - `chat`: Chat completion client
/// - `runtime_api_key`: LLM API key override set through the settings endpoint
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub embedder: Arc<dyn Embedder>,
    pub chat: Arc<ChatClient>,
    pub runtime_api_key: Arc<ArcSwapOption<String>>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut cors = CorsLayer::new()
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);

    // tower-http rejects a literal "*" inside an origin list; the wildcard has
    // to go through AllowOrigin::any (config validation forbids combining it
    // with credentials)
    let wildcard = config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard));
    if wildcard {
        cors = cors.allow_origin(tower_http::cors::Any);
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        cors = cors.allow_origin(origins);
    }

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Document upload and management routes
/// - The ask-question chat route
/// - Runtime settings routes
/// - Embedded frontend assets (dashboard, widget, demo page)
/// - OpenAPI docs with a Scalar UI at `/docs`
/// - Optional Prometheus metrics
/// - CORS and tracing middleware
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Allow some slack over the configured limit for multipart framing; the
    // upload handler enforces the real limit incrementally
    let body_limit = state.config.limits.max_upload_bytes as usize + 64 * 1024;

    let router = Router::new()
        .route("/health", get(|| async { axum::Json(serde_json::json!({"status": "ok"})) }))
        .route(
            "/upload-document/",
            post(api::handlers::documents::upload_document).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/ask-question/", post(api::handlers::chat::ask_question))
        .route(
            "/api/settings/",
            get(api::handlers::settings::get_settings).post(api::handlers::settings::update_settings),
        )
        .route("/documents", get(api::handlers::documents::list_documents))
        .route(
            "/documents/{id}",
            get(api::handlers::documents::get_document).delete(api::handlers::documents::delete_document),
        )
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(api::handlers::static_assets::serve_embedded_asset);

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    // Add Prometheus metrics if enabled
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Container for background services and their lifecycle management.
///
/// When dropped, the `drop_guard` cancels the shutdown token, signaling all
/// tasks to stop; [`shutdown`](BackgroundServices::shutdown) does the same but
/// also waits for the tasks to finish.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: tokio_util::sync::CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();

        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

/// Setup background services (currently the retention sweeper)
fn setup_background_services(
    store: Arc<DocumentStore>,
    config: &Config,
    shutdown_token: tokio_util::sync::CancellationToken,
) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    let mut background_tasks = Vec::new();

    if let Some(handle) = store::spawn_retention_sweeper(store, config.retention.clone(), shutdown_token.clone()) {
        background_tasks.push(handle);
    }

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] prepares the uploads directory, builds the
///    providers and the router, and starts background services
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, background services are
///    drained and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting document chat service with configuration: {:#?}", config);

        // The uploads directory must exist before the first upload streams in
        tokio::fs::create_dir_all(&config.uploads_dir).await?;

        let http_client = reqwest::Client::new();
        let embedder: Arc<dyn Embedder> = Arc::from(embedder::create_embedder(&config.embedder, http_client.clone()));
        let chat = Arc::new(ChatClient::new(http_client, config.llm.clone()));
        let store = Arc::new(DocumentStore::new());

        info!(embedder = embedder.name(), model = %config.llm.model, "Providers initialized");

        let shutdown_token = tokio_util::sync::CancellationToken::new();
        let bg_services = setup_background_services(store.clone(), &config, shutdown_token);

        let state = AppState::builder()
            .config(config.clone())
            .store(store)
            .embedder(embedder)
            .chat(chat)
            .runtime_api_key(Arc::new(ArcSwapOption::from(None)))
            .build();

        let router = build_router(&state)?;

        Ok(Self {
            router,
            config,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Document chat service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Shutdown background services and wait for tasks to complete
        self.bg_services.shutdown().await;

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::LlmConfig;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(uploads_dir: &std::path::Path, llm_url: &str, llm_key: Option<&str>) -> Config {
        Config {
            uploads_dir: uploads_dir.to_path_buf(),
            llm: LlmConfig {
                api_url: Url::parse(llm_url).unwrap(),
                api_key: llm_key.map(|k| k.to_string()),
                ..LlmConfig::default()
            },
            ..Config::default()
        }
    }

    async fn create_test_app(config: Config) -> (TestServer, BackgroundServices) {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        Application::new(config).await.expect("application should start").into_test_server()
    }

    fn completion_body(content: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 50, "completion_tokens": 10, "total_tokens": 60 }
        })
    }

    fn text_upload(content: &str, filename: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "document",
            Part::bytes(content.as_bytes().to_vec()).file_name(filename).mime_type("text/plain"),
        )
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        let response = server.get("/health").await;
        assert_eq!(response.status_code(), 200);
        let body: Value = response.json();
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn upload_then_ask_round_trip() {
        let uploads = tempfile::tempdir().unwrap();
        let llm = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Revenue grew 12% in the third quarter.")))
            .expect(1)
            .mount(&llm)
            .await;

        let (server, _bg) = create_test_app(test_config(uploads.path(), &llm.uri(), Some("sk-test"))).await;

        let upload = server
            .post("/upload-document/")
            .multipart(text_upload(
                "Quarterly results summary for shareholders.\nRevenue grew 12% in the third quarter.\nChurn fell below two percent.",
                "report.txt",
            ))
            .await;
        assert_eq!(upload.status_code(), 201);

        let body: Value = upload.json();
        let document_id = body["document_id"].as_str().unwrap().to_string();
        assert!(body["chunks"].as_u64().unwrap() >= 1);

        // The upload landed on disk under the generated id
        let stored: Vec<_> = std::fs::read_dir(uploads.path()).unwrap().collect();
        assert_eq!(stored.len(), 1);

        let answer = server
            .post("/ask-question/")
            .json(&json!({ "question": "How did revenue change?", "document_id": document_id }))
            .await;
        assert_eq!(answer.status_code(), 200);

        let body: Value = answer.json();
        assert_eq!(body["answer"], "Revenue grew 12% in the third quarter.");
    }

    #[tokio::test]
    async fn ask_unknown_document_returns_404() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", Some("sk-test"))).await;

        let response = server
            .post("/ask-question/")
            .json(&json!({
                "question": "anything",
                "document_id": "550e8400-e29b-41d4-a716-446655440000"
            }))
            .await;

        assert_eq!(response.status_code(), 404);
    }

    #[tokio::test]
    async fn blank_question_returns_400() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", Some("sk-test"))).await;

        let response = server
            .post("/ask-question/")
            .json(&json!({
                "question": "   ",
                "document_id": "550e8400-e29b-41d4-a716-446655440000"
            }))
            .await;

        assert_eq!(response.status_code(), 400);
    }

    #[tokio::test]
    async fn upload_unsupported_format_returns_400() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        let response = server.post("/upload-document/").multipart(text_upload("MZ...", "tool.exe")).await;

        assert_eq!(response.status_code(), 400);
        // Nothing may be left behind on disk
        assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_empty_file_returns_400_and_leaves_no_file() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        let response = server.post("/upload-document/").multipart(text_upload("", "empty.txt")).await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upload_with_only_short_lines_returns_400() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        let response = server.post("/upload-document/").multipart(text_upload("a\nbb\ncc\n", "short.txt")).await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_returns_413() {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = test_config(uploads.path(), "http://localhost:9", None);
        config.limits.max_upload_bytes = 64;
        let (server, _bg) = create_test_app(config).await;

        let big = "long enough line to survive chunking\n".repeat(10);
        let response = server.post("/upload-document/").multipart(text_upload(&big, "big.txt")).await;

        assert_eq!(response.status_code(), 413);
        assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn ask_without_any_api_key_returns_503() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        let upload = server
            .post("/upload-document/")
            .multipart(text_upload("A document with enough text to index properly.", "doc.txt"))
            .await;
        let document_id = upload.json::<Value>()["document_id"].as_str().unwrap().to_string();

        let response = server
            .post("/ask-question/")
            .json(&json!({ "question": "what is this?", "document_id": document_id }))
            .await;

        assert_eq!(response.status_code(), 503);
    }

    #[tokio::test]
    async fn settings_override_supplies_the_api_key() {
        let uploads = tempfile::tempdir().unwrap();
        let llm = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-from-settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&llm)
            .await;

        // No configured key: only the settings override can make this work
        let (server, _bg) = create_test_app(test_config(uploads.path(), &llm.uri(), None)).await;

        let settings = server.post("/api/settings/").json(&json!({"api_key": "sk-from-settings"})).await;
        assert_eq!(settings.status_code(), 200);
        let body: Value = settings.json();
        assert_eq!(body["status"], "success");

        let info: Value = server.get("/api/settings/").await.json();
        assert_eq!(info["api_key_configured"], true);
        assert_eq!(info["embedder"], "lexical");

        let upload = server
            .post("/upload-document/")
            .multipart(text_upload("A document with enough text to index properly.", "doc.txt"))
            .await;
        let document_id = upload.json::<Value>()["document_id"].as_str().unwrap().to_string();

        let answer = server
            .post("/ask-question/")
            .json(&json!({ "question": "what is this?", "document_id": document_id }))
            .await;
        assert_eq!(answer.status_code(), 200);
    }

    #[tokio::test]
    async fn clearing_the_settings_override_restores_unavailability() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        server.post("/api/settings/").json(&json!({"api_key": "sk-temp"})).await;
        let info: Value = server.get("/api/settings/").await.json();
        assert_eq!(info["api_key_configured"], true);

        server.post("/api/settings/").json(&json!({"api_key": ""})).await;
        let info: Value = server.get("/api/settings/").await.json();
        assert_eq!(info["api_key_configured"], false);
    }

    #[tokio::test]
    async fn document_management_round_trip() {
        let uploads = tempfile::tempdir().unwrap();
        let (server, _bg) = create_test_app(test_config(uploads.path(), "http://localhost:9", None)).await;

        let upload = server
            .post("/upload-document/")
            .multipart(text_upload("Meeting notes about the roadmap and hiring plans.", "notes.md"))
            .await;
        let document_id = upload.json::<Value>()["document_id"].as_str().unwrap().to_string();

        let listed: Value = server.get("/documents").await.json();
        assert_eq!(listed["object"], "list");
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["filename"], "notes.md");

        let fetched: Value = server.get(&format!("/documents/{document_id}")).await.json();
        assert_eq!(fetched["id"], document_id);

        let deleted = server.delete(&format!("/documents/{document_id}")).await;
        assert_eq!(deleted.status_code(), 200);
        let body: Value = deleted.json();
        assert_eq!(body["deleted"], true);

        // Gone from the index and from disk
        assert_eq!(server.get(&format!("/documents/{document_id}")).await.status_code(), 404);
        assert_eq!(std::fs::read_dir(uploads.path()).unwrap().count(), 0);

        let listed: Value = server.get("/documents").await.json();
        assert!(listed["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_llm_failure_surfaces_as_502() {
        let uploads = tempfile::tempdir().unwrap();
        let llm = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&llm)
            .await;

        let (server, _bg) = create_test_app(test_config(uploads.path(), &llm.uri(), Some("sk-test"))).await;

        let upload = server
            .post("/upload-document/")
            .multipart(text_upload("A document with enough text to index properly.", "doc.txt"))
            .await;
        let document_id = upload.json::<Value>()["document_id"].as_str().unwrap().to_string();

        let response = server
            .post("/ask-question/")
            .json(&json!({ "question": "what is this?", "document_id": document_id }))
            .await;

        assert_eq!(response.status_code(), 502);
        // The error body uses the `detail` shape the widget understands
        let body: Value = response.json();
        assert!(body["detail"].as_str().is_some());
    }
}

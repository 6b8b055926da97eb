//! HTTP API for the chat service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Browser chat UI |
//! | `POST` | `/chat` | `{query}` → `{answer}` |
//! | `GET`  | `/health` | Health check with RAG service status |
//!
//! Initialization failures (missing API key, missing index) do not crash the
//! server: it starts anyway and reports the service as unavailable — `/chat`
//! answers `503` and `/health` shows `"rag_service": "disconnected"`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based chat
//! clients can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::rag::RagService;

/// Shared application state. The service is `None` when initialization
/// failed at startup.
#[derive(Clone)]
struct AppState {
    service: Option<Arc<RagService>>,
}

/// Start the HTTP server. Attempts to initialize the RAG service first; on
/// failure the server still binds and reports unavailable.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = match RagService::new(config).await {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            eprintln!("Failed to initialize RAG service: {}", e);
            None
        }
    };

    let state = AppState { service };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_ui))
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("Chat API listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn service_unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "service_unavailable".to_string(),
        message: message.into(),
    }
}

// ============ GET / ============

/// The chat UI — a single static page talking to `POST /chat`.
async fn handle_ui() -> Html<&'static str> {
    Html(include_str!("../assets/chat.html"))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

/// Handler for `POST /chat`.
///
/// Query-time failures never surface here as HTTP errors — the service
/// converts them into an error-shaped answer string. The only error this
/// handler produces is `503` when the service never initialized.
async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let service = state
        .service
        .as_ref()
        .ok_or_else(|| service_unavailable("RAG service not available. Check server logs."))?;

    let answer = service.query(&request.query).await;
    Ok(Json(ChatResponse { answer }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    rag_service: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        rag_service: if state.service.is_some() {
            "connected".to_string()
        } else {
            "disconnected".to_string()
        },
    })
}

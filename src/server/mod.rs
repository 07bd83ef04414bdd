//! HTTP front end.
//!
//! `GET /` serves the chat page and starts a fresh conversation, `POST /chat`
//! answers one message, `GET /health` reports liveness.

use crate::error::VitrinError;
use crate::rag::RagEngine;
use crate::session::{SessionStore, DEFAULT_SESSION};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "vitrin_session";

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared application state.
pub struct AppState {
    pub engine: RagEngine,
    pub sessions: SessionStore,
    pub product_count: usize,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Bind to `addr` and serve until the process stops.
pub async fn serve(addr: &str, state: Arc<AppState>) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Used when the client does not keep cookies.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub products: usize,
    pub backend: bool,
}

/// Errors returned to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl From<VitrinError> for ApiError {
    fn from(e: VitrinError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

// === Handlers ===

/// Serve the chat page, resetting (or creating) the caller's session.
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let session_id = match session_from_cookies(&headers) {
        Some(id) if !id.is_empty() => {
            if state.sessions.contains(&id).await {
                state.sessions.reset(&id).await;
                id
            } else {
                state.sessions.create().await
            }
        }
        _ => state.sessions.create().await,
    };

    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id);
    let mut response = Html(INDEX_HTML).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// Answer one chat message.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let message = req
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| VitrinError::InvalidInput("Message is required".to_string()))?;

    let mut session_id = session_from_cookies(&headers)
        .or(req.session_id.clone())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());
    if !state.sessions.contains(&session_id).await {
        debug!("Unknown session {}, using the default session", session_id);
        session_id = DEFAULT_SESSION.to_string();
    }
    debug!("Chat message for session {}", session_id);

    // the lock is released before the model call
    let history = state.sessions.history(&session_id).await;
    let answer = state.engine.answer(message, &history).await;

    if answer.kind.is_recorded() {
        state
            .sessions
            .record_exchange(&session_id, message, &answer.answer)
            .await;
    }

    Ok(Json(ChatResponse {
        response: answer.answer,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        products: state.product_count,
        backend: state.engine.has_backend(),
    })
}

/// Extract the session id from the `Cookie` header.
fn session_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

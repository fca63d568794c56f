//! HTTP surface: shared state, router, and the relay handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::RelayError;
use crate::relay::{self, OutboundMessage, ParsedBody, RelayRequest};
use crate::telegram::TelegramClient;

/// Shared application state. Immutable after startup; invocations share
/// nothing else, so concurrent requests need no coordination.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub telegram: Arc<TelegramClient>,
}

impl AppState {
    pub fn new(config: Config, telegram: TelegramClient) -> Self {
        Self {
            config: Arc::new(config),
            telegram: Arc::new(telegram),
        }
    }
}

/// Body of every relay response.
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The relay route is registered for every method so the method check is
/// the handler's own first validation step.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/telegram-proxy", any(telegram_proxy))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// One browser report in, one relay response out.
async fn telegram_proxy(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match handle(&state, method, &headers, &body).await {
        Ok(data) => (
            StatusCode::OK,
            Json(RelayResponse {
                success: true,
                telegram_data: Some(data),
                error: None,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Ordered, fail-fast validation; the first failing check wins.
async fn handle(
    state: &AppState,
    method: Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Value, RelayError> {
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    if !state.config.has_credentials() {
        error!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID is not set");
        return Err(RelayError::ServerMisconfigured);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let request = match relay::parse_body(content_type, body)? {
        ParsedBody::Relay(request) => request,
        ParsedBody::RawFallback(raw) => {
            debug!(bytes = raw.len(), "non-JSON request body, no caption present");
            RelayRequest::default()
        }
    };

    if request.caption.is_empty() {
        return Err(RelayError::EmptyCaption);
    }

    let data = match relay::plan_message(request)? {
        OutboundMessage::Text { caption } => state.telegram.send_message(&caption).await?,
        OutboundMessage::Photo { caption, image } => {
            state.telegram.send_photo(image, &caption).await?
        }
    };

    info!("Report forwarded to Telegram");
    Ok(data)
}

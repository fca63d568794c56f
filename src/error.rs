//! Fault taxonomy for the relay handler.
//!
//! The browser shows `error` verbatim as status text, so the display
//! strings are short human sentences and never contain secrets.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Shown when Telegram answers `ok: false` without a description field.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Telegram rejected the message";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("only POST requests are allowed")]
    MethodNotAllowed,

    /// Deliberately does not say which credential is missing.
    #[error("server configuration error (credentials missing)")]
    ServerMisconfigured,

    /// Body or image data undecodable as its declared encoding.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("caption must not be empty")]
    EmptyCaption,

    /// Telegram answered with something that is not JSON. Carries a
    /// bounded excerpt of the raw body, never the whole thing.
    #[error("Telegram returned an unreadable response: {excerpt}")]
    UpstreamMalformedResponse { status: u16, excerpt: String },

    /// Telegram answered `ok: false`.
    #[error("{description}")]
    UpstreamRejected { status: u16, description: String },

    /// Network-level failure reaching Telegram. The display is fixed; the
    /// underlying reqwest error embeds the token-bearing URL and is only
    /// ever logged after `without_url()`.
    #[error("internal error while contacting Telegram")]
    TransportFailure,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ServerMisconfigured | Self::TransportFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::MalformedPayload(_) | Self::EmptyCaption => StatusCode::BAD_REQUEST,
            Self::UpstreamMalformedResponse { status, .. } => {
                mirrored_status(*status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::UpstreamRejected { status, .. } => {
                mirrored_status(*status, StatusCode::BAD_REQUEST)
            }
        }
    }
}

/// Forward an upstream error status as-is. Anything else (a 2xx paired
/// with a failure body, or an out-of-range code) falls back, since echoing
/// a success status next to `success: false` would contradict itself.
fn mirrored_status(upstream: u16, fallback: StatusCode) -> StatusCode {
    match StatusCode::from_u16(upstream) {
        Ok(code) if code.is_client_error() || code.is_server_error() => code,
        _ => fallback,
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

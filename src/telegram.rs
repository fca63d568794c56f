//! Outbound Telegram Bot API client.
//!
//! Two endpoints are exercised: `sendMessage` (JSON) and `sendPhoto`
//! (multipart). Both replies go through the same normalization: the body
//! is read as text first, then held to the expected JSON shape, so a
//! non-JSON answer from a proxy or load balancer surfaces as a structured
//! fault instead of a parse panic.

use anyhow::Context;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{RelayError, DEFAULT_REJECTION_MESSAGE};

/// Caption formatting directive, sent on both endpoints.
const PARSE_MODE: &str = "Markdown";
/// Fixed name and type for the uploaded capture.
const PHOTO_FILE_NAME: &str = "captured_photo.jpeg";
const PHOTO_CONTENT_TYPE: &str = "image/jpeg";
/// Longest upstream-body excerpt quoted back in an error.
const EXCERPT_MAX_CHARS: usize = 100;

pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .context("failed to build the upstream HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Forward a text-only report via `sendMessage`.
    pub async fn send_message(&self, text: &str) -> Result<Value, RelayError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": PARSE_MODE,
        });

        debug!("Forwarding text message to Telegram");

        let response = self
            .http
            .post(self.endpoint("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        normalize(response).await
    }

    /// Forward a photo with caption via `sendPhoto`.
    ///
    /// The multipart body is assembled up front and sent with an explicit
    /// Content-Length. A streamed (chunked) upload makes the Bot API hang
    /// or reject the request, so the body must be sized.
    pub async fn send_photo(&self, image: Vec<u8>, caption: &str) -> Result<Value, RelayError> {
        let boundary = format!("relay-{}", Uuid::new_v4().simple());
        let body = encode_multipart(&boundary, &self.chat_id, caption, &image);

        debug!(bytes = image.len(), "Forwarding photo to Telegram");

        let response = self
            .http
            .post(self.endpoint("sendPhoto"))
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        normalize(response).await
    }
}

/// Log the failure without its URL (the URL embeds the token), then map it
/// to the fixed-message taxonomy entry.
fn transport_error(err: reqwest::Error) -> RelayError {
    error!("Telegram request failed: {}", err.without_url());
    RelayError::TransportFailure
}

/// Hold an upstream reply to the expected `{ok, ...}` shape.
async fn normalize(response: reqwest::Response) -> Result<Value, RelayError> {
    let status = response.status().as_u16();
    let raw = response.text().await.map_err(transport_error)?;

    let data: Value = match serde_json::from_str(&raw) {
        Ok(data) => data,
        Err(_) => {
            error!(status, "Telegram returned a non-JSON body");
            return Err(RelayError::UpstreamMalformedResponse {
                status,
                excerpt: excerpt(&raw),
            });
        }
    };

    if data.get("ok").and_then(Value::as_bool) != Some(true) {
        let description = data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_REJECTION_MESSAGE)
            .to_string();
        error!(status, "Telegram rejected the call: {}", description);
        return Err(RelayError::UpstreamRejected {
            status,
            description,
        });
    }

    Ok(data)
}

/// First `EXCERPT_MAX_CHARS` characters, kept on char boundaries.
fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_MAX_CHARS).collect()
}

/// multipart/form-data body: the text fields, then the photo part with its
/// fixed filename and content type, then the closing boundary.
fn encode_multipart(boundary: &str, chat_id: &str, caption: &str, image: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(image.len() + 512);
    push_text_part(&mut body, boundary, "chat_id", chat_id);
    push_text_part(&mut body, boundary, "caption", caption);
    push_text_part(&mut body, boundary, "parse_mode", PARSE_MODE);
    push_file_part(
        &mut body,
        boundary,
        "photo",
        PHOTO_FILE_NAME,
        PHOTO_CONTENT_TYPE,
        image,
    );
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn push_text_part(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
    );
}

fn push_file_part(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) {
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
}

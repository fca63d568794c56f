//! Inbound request model: body parsing and outbound message planning.

use serde::Deserialize;
use serde_json::Value;

use crate::error::RelayError;
use crate::media;

/// One browser report. The field names are the deployed capture page's
/// wire contract.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelayRequest {
    pub caption: String,
    #[serde(rename = "base64Image")]
    pub base64_image: Option<String>,
    #[serde(rename = "isPhoto")]
    pub is_photo: bool,
}

/// Which body-parsing path ran.
#[derive(Debug)]
pub enum ParsedBody {
    /// JSON body in (or defaulting into) the expected shape.
    Relay(RelayRequest),
    /// Non-JSON content type; the raw text is preserved verbatim. Carries
    /// no caption, so it fails the caption check downstream.
    RawFallback(String),
}

/// Parse the request body according to its declared content type.
///
/// Tolerant by contract: an empty body, or valid JSON of the wrong shape,
/// degrades to an empty `RelayRequest` (no caption). Only a body that is
/// undecodable as its declared content type is a `MalformedPayload` fault.
/// A missing content type is treated as a JSON attempt.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<ParsedBody, RelayError> {
    if body.is_empty() {
        return Ok(ParsedBody::Relay(RelayRequest::default()));
    }

    let declared_json = content_type.map_or(true, |value| {
        value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .eq_ignore_ascii_case("application/json")
    });

    if declared_json {
        let value: Value = serde_json::from_slice(body).map_err(|_| {
            RelayError::MalformedPayload("request body is not valid JSON".into())
        })?;
        let request = serde_json::from_value(value).unwrap_or_default();
        Ok(ParsedBody::Relay(request))
    } else {
        let text = std::str::from_utf8(body).map_err(|_| {
            RelayError::MalformedPayload("request body is not valid text".into())
        })?;
        Ok(ParsedBody::RawFallback(text.to_string()))
    }
}

/// What gets sent upstream. Built per invocation, dropped afterwards.
#[derive(Debug)]
pub enum OutboundMessage {
    Text { caption: String },
    Photo { caption: String, image: Vec<u8> },
}

/// Decide between the text and photo paths.
///
/// A photo request without an image degrades to text; an image that does
/// not decode is a client fault.
pub fn plan_message(request: RelayRequest) -> Result<OutboundMessage, RelayError> {
    match (request.is_photo, request.base64_image) {
        (true, Some(payload)) => {
            let image = media::decode_image_payload(&payload).map_err(|_| {
                RelayError::MalformedPayload("image data is not valid base64".into())
            })?;
            Ok(OutboundMessage::Photo {
                caption: request.caption,
                image,
            })
        }
        _ => Ok(OutboundMessage::Text {
            caption: request.caption,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(content_type: Option<&str>, body: &str) -> ParsedBody {
        parse_body(content_type, body.as_bytes()).unwrap()
    }

    #[test]
    fn test_json_body_parses_into_request() {
        let body = r#"{"caption":"hello","isPhoto":false}"#;
        match parsed(Some("application/json"), body) {
            ParsedBody::Relay(request) => {
                assert_eq!(request.caption, "hello");
                assert!(!request.is_photo);
                assert!(request.base64_image.is_none());
            }
            other => panic!("expected Relay, got {other:?}"),
        }
    }

    #[test]
    fn test_content_type_parameters_are_ignored() {
        let body = r#"{"caption":"hi"}"#;
        match parsed(Some("application/json; charset=utf-8"), body) {
            ParsedBody::Relay(request) => assert_eq!(request.caption, "hi"),
            other => panic!("expected Relay, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_content_type_is_a_json_attempt() {
        match parsed(None, r#"{"caption":"hi"}"#) {
            ParsedBody::Relay(request) => assert_eq!(request.caption, "hi"),
            other => panic!("expected Relay, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_degrades_to_no_caption() {
        match parse_body(Some("application/json"), b"").unwrap() {
            ParsedBody::Relay(request) => assert!(request.caption.is_empty()),
            other => panic!("expected Relay, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_shape_json_degrades_to_no_caption() {
        match parsed(Some("application/json"), "[1, 2, 3]") {
            ParsedBody::Relay(request) => assert!(request.caption.is_empty()),
            other => panic!("expected Relay, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_is_malformed_payload() {
        let err = parse_body(Some("application/json"), b"{not json").unwrap_err();
        assert!(matches!(err, RelayError::MalformedPayload(_)));
    }

    #[test]
    fn test_text_body_is_preserved_as_raw_fallback() {
        match parsed(Some("text/plain"), "just some text") {
            ParsedBody::RawFallback(raw) => assert_eq!(raw, "just some text"),
            other => panic!("expected RawFallback, got {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_text_body_is_malformed_payload() {
        let err = parse_body(Some("text/plain"), &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, RelayError::MalformedPayload(_)));
    }

    #[test]
    fn test_photo_request_decodes_the_image() {
        let request = RelayRequest {
            caption: "report".into(),
            base64_image: Some("data:image/jpeg;base64,AAAA".into()),
            is_photo: true,
        };
        match plan_message(request).unwrap() {
            OutboundMessage::Photo { caption, image } => {
                assert_eq!(caption, "report");
                assert_eq!(image, vec![0, 0, 0]);
            }
            other => panic!("expected Photo, got {other:?}"),
        }
    }

    #[test]
    fn test_photo_flag_without_image_degrades_to_text() {
        let request = RelayRequest {
            caption: "report".into(),
            base64_image: None,
            is_photo: true,
        };
        assert!(matches!(
            plan_message(request).unwrap(),
            OutboundMessage::Text { .. }
        ));
    }

    #[test]
    fn test_image_without_photo_flag_stays_text() {
        let request = RelayRequest {
            caption: "report".into(),
            base64_image: Some("data:image/jpeg;base64,AAAA".into()),
            is_photo: false,
        };
        assert!(matches!(
            plan_message(request).unwrap(),
            OutboundMessage::Text { .. }
        ));
    }

    #[test]
    fn test_undecodable_image_is_malformed_payload() {
        let request = RelayRequest {
            caption: "report".into(),
            base64_image: Some("data:image/jpeg;base64,@@@@".into()),
            is_photo: true,
        };
        assert!(matches!(
            plan_message(request).unwrap_err(),
            RelayError::MalformedPayload(_)
        ));
    }
}

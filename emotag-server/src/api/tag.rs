//! Sentence tagging endpoint
//!
//! Accepts the request in either of two shapes: the sentence list at the
//! top level, or JSON-encoded inside a `body` string field (the shape API
//! gateways deliver). Any failure past parsing produces a structured 500
//! payload echoing the offending request; the process stays alive.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::error;

use crate::pipeline::TagPipeline;
use crate::AppState;
use emotag_common::config::DEFAULT_BATCH_SIZE;

/// Key for sentences to process, expected in the request object
const SENT_LIST_KEY: &str = "sent_list";
/// Key for the per-request batch size override
const BATCH_SIZE_KEY: &str = "BATCH_SIZE";

/// Parsed tagging request
struct TagRequest {
    sentences: Vec<String>,
    batch_size: usize,
}

/// POST /api/tag
pub async fn tag_sentences(State(state): State<AppState>, Json(event): Json<Value>) -> Response {
    match handle(&state, &event).await {
        Ok(mapping) => (StatusCode::OK, Json(mapping)).into_response(),
        Err(exception) => {
            error!("Tag request failed: {}", exception);
            let payload = json!({
                "event": event,
                "exception": exception,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

async fn handle(state: &AppState, event: &Value) -> Result<HashMap<String, String>, String> {
    let request = match parse_request(event).map_err(|e| e.to_string())? {
        Some(request) => request,
        // No sentence list is not an error: nothing to do, empty mapping
        None => return Ok(HashMap::new()),
    };

    let engine = state.engine.get_or_init().await.map_err(|e| e.to_string())?;

    let pipeline = TagPipeline::new(&state.cache, engine.as_ref(), request.batch_size);
    pipeline
        .run(&request.sentences)
        .await
        .map_err(|e| e.to_string())
}

/// Extract the sentence list and batch size from the request envelope.
///
/// The top-level shape is checked first; if it carries no non-empty
/// sentence list, the nested `body` shape is tried. The batch size comes
/// from whichever shape supplied the sentences and overrides the default
/// for this call only.
fn parse_request(event: &Value) -> Result<Option<TagRequest>, emotag_common::Error> {
    if let Some(request) = parse_shape(event)? {
        return Ok(Some(request));
    }

    if let Some(body) = event.get("body") {
        let body_str = body.as_str().ok_or_else(|| {
            emotag_common::Error::InvalidInput("body field must be a JSON string".to_string())
        })?;
        let inner: Value = serde_json::from_str(body_str).map_err(|e| {
            emotag_common::Error::InvalidInput(format!("body field is not valid JSON: {}", e))
        })?;
        return parse_shape(&inner);
    }

    Ok(None)
}

/// Parse one envelope shape (top level or decoded body)
fn parse_shape(source: &Value) -> Result<Option<TagRequest>, emotag_common::Error> {
    let list = match source.get(SENT_LIST_KEY) {
        Some(list) => list,
        None => return Ok(None),
    };

    let entries = list.as_array().ok_or_else(|| {
        emotag_common::Error::InvalidInput(format!("{} must be an array", SENT_LIST_KEY))
    })?;

    let mut sentences = Vec::with_capacity(entries.len());
    for entry in entries {
        let sentence = entry.as_str().ok_or_else(|| {
            emotag_common::Error::InvalidInput(format!(
                "{} entries must be strings",
                SENT_LIST_KEY
            ))
        })?;
        sentences.push(sentence.to_string());
    }

    if sentences.is_empty() {
        return Ok(None);
    }

    let batch_size = match source.get(BATCH_SIZE_KEY) {
        Some(value) => {
            let size = value.as_u64().ok_or_else(|| {
                emotag_common::Error::InvalidInput(format!(
                    "{} must be a positive integer",
                    BATCH_SIZE_KEY
                ))
            })?;
            if size == 0 {
                return Err(emotag_common::Error::InvalidInput(format!(
                    "{} must be a positive integer",
                    BATCH_SIZE_KEY
                )));
            }
            size as usize
        }
        None => DEFAULT_BATCH_SIZE,
    };

    Ok(Some(TagRequest { sentences, batch_size }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_shape_parses() {
        let event = json!({"sent_list": ["a", "b"], "BATCH_SIZE": 5});
        let request = parse_request(&event).unwrap().unwrap();
        assert_eq!(request.sentences, vec!["a", "b"]);
        assert_eq!(request.batch_size, 5);
    }

    #[test]
    fn nested_body_shape_parses() {
        let event = json!({"body": "{\"sent_list\": [\"a\"], \"BATCH_SIZE\": 2}"});
        let request = parse_request(&event).unwrap().unwrap();
        assert_eq!(request.sentences, vec!["a"]);
        assert_eq!(request.batch_size, 2);
    }

    #[test]
    fn top_level_wins_when_non_empty() {
        let event = json!({
            "sent_list": ["top"],
            "body": "{\"sent_list\": [\"nested\"]}"
        });
        let request = parse_request(&event).unwrap().unwrap();
        assert_eq!(request.sentences, vec!["top"]);
    }

    #[test]
    fn empty_top_level_falls_through_to_body() {
        let event = json!({
            "sent_list": [],
            "body": "{\"sent_list\": [\"nested\"]}"
        });
        let request = parse_request(&event).unwrap().unwrap();
        assert_eq!(request.sentences, vec!["nested"]);
    }

    #[test]
    fn missing_list_is_not_an_error() {
        assert!(parse_request(&json!({})).unwrap().is_none());
        assert!(parse_request(&json!({"other": 1})).unwrap().is_none());
    }

    #[test]
    fn batch_size_defaults_when_absent() {
        let event = json!({"sent_list": ["a"]});
        let request = parse_request(&event).unwrap().unwrap();
        assert_eq!(request.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_or_non_integer_batch_size_is_rejected() {
        assert!(parse_request(&json!({"sent_list": ["a"], "BATCH_SIZE": 0})).is_err());
        assert!(parse_request(&json!({"sent_list": ["a"], "BATCH_SIZE": "thirty"})).is_err());
        assert!(parse_request(&json!({"sent_list": ["a"], "BATCH_SIZE": -4})).is_err());
    }

    #[test]
    fn non_string_sentences_are_rejected() {
        assert!(parse_request(&json!({"sent_list": ["a", 7]})).is_err());
    }

    #[test]
    fn malformed_body_json_is_rejected() {
        assert!(parse_request(&json!({"body": "not json"})).is_err());
        assert!(parse_request(&json!({"body": 42})).is_err());
    }
}

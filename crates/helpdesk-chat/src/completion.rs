//! Completion service contract and wire schema.
//!
//! The schema follows the `generateContent` request/response shape: a single
//! conversational turn with one `user` message, answered by a list of
//! candidates whose content is split into text parts.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Errors from a completion call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Remote language-model completion.
pub trait CompletionService: Send + Sync {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, CompletionError>> + Send;
}

// =============================================================================
// Request
// =============================================================================

/// Request body: `{ "contents": [ { "role": "user", "parts": [ { "text": … } ] } ] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub contents: Vec<Content>,
}

impl CompletionRequest {
    /// A single user turn carrying `text`.
    pub fn user_turn(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(text.into()),
                }],
            }],
        }
    }
}

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A text segment of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// =============================================================================
// Response
// =============================================================================

/// Response body. Unknown fields (usage metadata, safety ratings) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl CompletionResponse {
    /// Response carrying one candidate with the given text parts.
    pub fn with_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: parts
                        .into_iter()
                        .map(|t| Part {
                            text: Some(t.into()),
                        })
                        .collect(),
                }),
                finish_reason: Some("STOP".to_string()),
            }]),
        }
    }

    /// First non-blank text part of the first candidate, verbatim.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_deref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .find(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = CompletionRequest::user_turn("hello");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "contents": [ { "role": "user", "parts": [ { "text": "hello" } ] } ] })
        );
    }

    #[test]
    fn test_parse_full_response() {
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [ { "text": "Five days." } ] },
                "finishReason": "STOP",
                "safetyRatings": []
            }],
            "usageMetadata": { "totalTokenCount": 12 }
        });
        let response: CompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.first_text(), Some("Five days."));
        assert_eq!(
            response.candidates.unwrap()[0].finish_reason.as_deref(),
            Some("STOP")
        );
    }

    #[test]
    fn test_first_text_skips_blank_parts() {
        let response = CompletionResponse::with_parts(["", "  ", "answer", "later"]);
        assert_eq!(response.first_text(), Some("answer"));
    }

    #[test]
    fn test_first_text_is_verbatim() {
        let response = CompletionResponse::with_parts(["  padded *markdown*\n"]);
        assert_eq!(response.first_text(), Some("  padded *markdown*\n"));
    }

    #[test]
    fn test_empty_shapes_have_no_text() {
        let shapes = [
            json!({}),
            json!({ "candidates": null }),
            json!({ "candidates": [] }),
            json!({ "candidates": [ {} ] }),
            json!({ "candidates": [ { "content": {} } ] }),
            json!({ "candidates": [ { "content": { "parts": [] } } ] }),
            json!({ "candidates": [ { "content": { "parts": [ {} ] } } ] }),
            json!({ "candidates": [ { "content": { "parts": [ { "text": "" } ] } } ] }),
        ];
        for shape in shapes {
            let response: CompletionResponse = serde_json::from_value(shape.clone()).unwrap();
            assert_eq!(response.first_text(), None, "shape {}", shape);
        }
    }

    #[test]
    fn test_only_first_candidate_is_used() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "" } ] } },
                { "content": { "parts": [ { "text": "second" } ] } }
            ]
        });
        let response: CompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.first_text(), None);
    }

    #[test]
    fn test_schema_deviation_fails_to_parse() {
        let bad = json!({ "candidates": "not-a-list" });
        assert!(serde_json::from_value::<CompletionResponse>(bad).is_err());
        let bad = json!({ "candidates": [ { "content": { "parts": [ { "text": 7 } ] } } ] });
        assert!(serde_json::from_value::<CompletionResponse>(bad).is_err());
    }
}

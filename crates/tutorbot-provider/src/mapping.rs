//! Translation of raw completion bodies into [`CompletionResponse`].
//!
//! Required fields (`id`, `object`, `created`, `model`, `choices`, each choice's `index` and
//! `message`, `usage`, `system_fingerprint`, `x_groq`) must be present with the right type.
//! `logprobs` and `finish_reason` are optional and become `None` when missing or null.
//! Choices keep the order the server sent them in.

use crate::error::{ProviderError, Result};
use crate::models::CompletionResponse;
use serde::Deserialize;
use serde_json::Value;

/// Map a decoded JSON body, keeping `raw` on failure for diagnostics.
pub fn map_response(raw: Value) -> Result<CompletionResponse> {
    match CompletionResponse::deserialize(&raw) {
        Ok(response) => Ok(response),
        Err(e) => Err(ProviderError::ResponseShape {
            reason: e.to_string(),
            raw,
        }),
    }
}

/// Parse a response body as JSON, then map it.
///
/// A body that is not JSON at all is kept as a JSON string in the error.
pub fn parse_body(body: &str) -> Result<CompletionResponse> {
    let raw: Value = serde_json::from_str(body).map_err(|e| ProviderError::ResponseShape {
        reason: format!("response body is not valid JSON: {}", e),
        raw: Value::String(body.to_string()),
    })?;
    map_response(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "id": "chatcmpl-abc",
            "object": "chat.completion",
            "created": 1_717_000_000u64,
            "model": "mixtral-8x7b-32768",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "Practice daily."},
                    "logprobs": null,
                    "finish_reason": "stop"
                }
            ],
            "usage": {
                "queue_time": 0.018,
                "prompt_tokens": 16,
                "prompt_time": 0.003,
                "completion_tokens": 50,
                "completion_time": 0.081,
                "total_tokens": 66,
                "total_time": 0.084
            },
            "system_fingerprint": "fp_c5f20b5bb1",
            "x_groq": {"id": "req_01abc"}
        })
    }

    #[test]
    fn test_maps_complete_body() {
        let response = map_response(body()).unwrap();

        assert_eq!(response.id, "chatcmpl-abc");
        assert_eq!(response.object, "chat.completion");
        assert_eq!(response.created, 1_717_000_000);
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].message.content, "Practice daily.");
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.total_tokens, 66);
        assert_eq!(response.usage.queue_time, 0.018);
        assert_eq!(response.system_fingerprint, "fp_c5f20b5bb1");
        assert_eq!(response.provider_metadata.id, "req_01abc");
    }

    #[test]
    fn test_preserves_choice_order() {
        let mut raw = body();
        raw["choices"] = json!([
            {"index": 2, "message": {"role": "assistant", "content": "c"}},
            {"index": 0, "message": {"role": "assistant", "content": "a"}},
            {"index": 1, "message": {"role": "assistant", "content": "b"}}
        ]);

        let response = map_response(raw).unwrap();
        let indices: Vec<u32> = response.choices.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2, 0, 1]);
        assert_eq!(response.choices[0].message.content, "c");
    }

    #[test]
    fn test_missing_optional_fields_are_absent() {
        let mut raw = body();
        raw["choices"] = json!([
            {"index": 0, "message": {"role": "assistant", "content": "ok"}}
        ]);

        let response = map_response(raw).unwrap();
        assert!(response.choices[0].logprobs.is_none());
        assert!(response.choices[0].finish_reason.is_none());
    }

    #[test]
    fn test_logprobs_kept_opaque() {
        let mut raw = body();
        raw["choices"][0]["logprobs"] = json!({"content": [{"token": "P", "logprob": -0.1}]});

        let response = map_response(raw).unwrap();
        assert_eq!(
            response.choices[0].logprobs.as_ref().unwrap()["content"][0]["token"],
            "P"
        );
    }

    #[test]
    fn test_missing_usage_is_shape_error() {
        let mut raw = body();
        raw.as_object_mut().unwrap().remove("usage");

        let err = map_response(raw.clone()).unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::ResponseShape);
        match err {
            ProviderError::ResponseShape { reason, raw: kept } => {
                assert!(reason.contains("usage"), "reason was: {}", reason);
                assert_eq!(kept, raw);
            }
            other => panic!("Expected ResponseShape, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_choice_fields() {
        for field in ["index", "message"] {
            let mut raw = body();
            raw["choices"][0].as_object_mut().unwrap().remove(field);
            let err = map_response(raw).unwrap_err();
            assert_eq!(err.kind(), ProviderErrorKind::ResponseShape, "field {}", field);
        }
    }

    #[test]
    fn test_missing_provider_metadata_is_shape_error() {
        let mut raw = body();
        raw.as_object_mut().unwrap().remove("x_groq");
        assert!(map_response(raw).is_err());

        let mut raw = body();
        raw["x_groq"] = json!({});
        assert!(map_response(raw).is_err());
    }

    #[test]
    fn test_mistyped_field_is_shape_error() {
        let mut raw = body();
        raw["created"] = json!("yesterday");
        let err = map_response(raw).unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::ResponseShape);
    }

    #[test]
    fn test_empty_choices_maps() {
        let mut raw = body();
        raw["choices"] = json!([]);
        let response = map_response(raw).unwrap();
        assert!(response.choices.is_empty());
    }

    #[test]
    fn test_parse_body_rejects_non_json() {
        let err = parse_body("<html>bad gateway</html>").unwrap_err();
        match err {
            ProviderError::ResponseShape { raw, .. } => {
                assert_eq!(raw, Value::String("<html>bad gateway</html>".to_string()));
            }
            other => panic!("Expected ResponseShape, got {:?}", other),
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let first = map_response(body()).unwrap();
        let second = map_response(body()).unwrap();
        assert_eq!(first, second);
    }
}

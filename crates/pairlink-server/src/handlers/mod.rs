//! HTTP route handlers, grouped by area.

pub mod admin;
pub mod health;
pub mod pairing;

use crate::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

/// Unwrap a JSON body, treating a missing or unparsable one as absent.
pub(crate) fn require_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(body)) if body.is_object() => Ok(body),
        _ => Err(ApiError::body_required()),
    }
}

/// Extract an optional string field from a JSON body.
pub(crate) fn get_str_field<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(|v| v.as_str())
}

/// Current time for response bodies.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_str_field() {
        let body = json!({"code": "ABC123", "n": 4});
        assert_eq!(get_str_field(&body, "code"), Some("ABC123"));
        assert_eq!(get_str_field(&body, "n"), None);
        assert_eq!(get_str_field(&body, "link"), None);
    }

    #[test]
    fn test_require_body_rejects_non_objects() {
        assert!(require_body(Ok(Json(json!({"code": "ABC123"})))).is_ok());
        assert!(require_body(Ok(Json(json!("ABC123")))).is_err());
    }

    #[test]
    fn test_timestamp_is_utc() {
        assert!(timestamp().ends_with('Z'));
    }
}

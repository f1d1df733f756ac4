pub mod notifications;
pub mod orchestrator;

pub use notifications::notification_router;
pub use orchestrator::orchestrator_router;

use crate::app::error::ApiError;
use axum::body::Bytes;
use serde_json::{Map, Value};

/// Reads a JSON object body. An empty body is the empty object; anything else
/// that is not a JSON object is a 400.
pub(crate) fn json_fields(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid JSON body: {}", e))),
    }
}

/// Interprets the `approved` field. Absent or null means not approved; an
/// unrecognised value is a 400 and never counts as a rejection.
pub(crate) fn approval_flag(fields: &Map<String, Value>) -> Result<bool, ApiError> {
    let invalid = || ApiError::BadRequest("Field 'approved' must be true or false".to_string());

    match fields.get("approved") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).ok_or_else(invalid),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            _ => Err(invalid()),
        },
        Some(_) => Err(invalid()),
    }
}

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use counterpos_infra::DispatchError;

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        DispatchError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DispatchError::Store(e) => {
            tracing::error!(error = %e, "workbook access failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        other => {
            tracing::error!(error = %other, "command failed");
            internal(other.to_string())
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn internal(message: impl Into<String>) -> Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
}

pub fn bad_request(message: impl Into<String>) -> Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Unwrap a JSON body, turning axum's rejection into the API error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text()))
}

/// Parse a path or query value; failures become 400 `invalid_<what>`.
pub fn parse<T>(raw: &str, code: &'static str) -> Result<T, Response>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| json_error(StatusCode::BAD_REQUEST, code, e.to_string()))
}

/// Parse an optional query value.
pub fn parse_opt<T>(raw: Option<&str>, code: &'static str) -> Result<Option<T>, Response>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse(s.trim(), code))
        .transpose()
}

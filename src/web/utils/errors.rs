use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::Value;

pub const CODE_INTERNAL: &str = "SNIFF-500";
pub const CODE_BAD_REQUEST: &str = "SNIFF-400";
pub const CODE_FORBIDDEN: &str = "SNIFF-403";
pub const CODE_NOT_FOUND: &str = "SNIFF-404";
pub const CODE_BAD_GATEWAY: &str = "SNIFF-502";

pub fn bad_request_json(details: &str) -> Value {
    error_json(CODE_BAD_REQUEST, "Invalid request", Some(details))
}

pub fn forbidden_json(details: &str) -> Value {
    error_json(CODE_FORBIDDEN, "URL outside allowed scope", Some(details))
}

pub fn not_found_json(details: &str) -> Value {
    error_json(CODE_NOT_FOUND, "Not found", Some(details))
}

pub fn bad_gateway_json(details: &str) -> Value {
    error_json(CODE_BAD_GATEWAY, "Upstream fetch failed", Some(details))
}

pub fn internal_error_json(details: &str) -> Value {
    error_json(CODE_INTERNAL, "Internal error", Some(details))
}

pub fn error_json(code: &str, safe_message: &str, details: Option<&str>) -> Value {
    let message = if cfg!(debug_assertions) {
        details.unwrap_or(safe_message)
    } else {
        safe_message
    };
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

pub fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_code_and_status() {
        let value = forbidden_json("https://example.com");
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], CODE_FORBIDDEN);
        assert!(value["message"].is_string());
    }
}

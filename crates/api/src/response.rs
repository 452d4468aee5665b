//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard success envelope.
///
/// Error paths never pass through here; they render as
/// `{"error": {...}}` via `AppError::into_response`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_payload_in_data_field() {
        let value = serde_json::to_value(ApiResponse::ok(vec!["a", "b"])).unwrap();

        assert_eq!(value, serde_json::json!({ "data": ["a", "b"] }));
    }

    #[test]
    fn test_renders_as_success() {
        let response = ApiResponse::ok(()).into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

//! Error Conversion
//!
//! Implements `IntoResponse` for `ApiError` so handlers can return it
//! directly. Errors render as JSON:
//!
//! ```json
//! {
//!   "error": "chat not found",
//!   "status": 404
//! }
//! ```

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::error::types::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("Internal Server Error"))
                    .unwrap()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_renders_json_body() {
        let response = ApiError::NotFound("chat").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_forbidden_renders_403() {
        let response = ApiError::forbidden("not a member of this chat").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

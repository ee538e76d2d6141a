//! `{ success, data, message }` response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body of every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Wrap in a `201 Created` response.
    pub fn created(self) -> (StatusCode, Self) {
        (StatusCode::CREATED, self)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{ "id": n }` payload of create endpoints.
#[derive(Debug, Serialize)]
pub struct CreatedId {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_omits_message() {
        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn test_with_message() {
        let body =
            serde_json::to_value(ApiResponse::ok(CreatedId { id: 7 }).with_message("creado"))
                .unwrap();
        assert_eq!(body["data"]["id"], 7);
        assert_eq!(body["message"], "creado");
    }
}

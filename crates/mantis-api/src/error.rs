//! HTTP error mapping.
//!
//! `InvalidInput` → 400, `NotFound` → 404, `Conflict` → 409; anything else
//! is logged and answered with a generic 500 whose detail is only echoed
//! outside production.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Message of every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor";

static EXPOSE_ERROR_DETAIL: AtomicBool = AtomicBool::new(false);

/// Whether 500 responses include the underlying error text. Set once at
/// startup from the environment.
pub fn set_expose_error_detail(expose: bool) {
    EXPOSE_ERROR_DETAIL.store(expose, Ordering::Relaxed);
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(mantis_core::Error),
}

impl From<mantis_core::Error> for ApiError {
    fn from(err: mantis_core::Error) -> Self {
        if let mantis_core::Error::Database(sqlx_err) = &err {
            let msg = sqlx_err.to_string();
            if msg.contains("Duplicate entry") {
                return ApiError::Conflict("el registro ya existe".to_string());
            }
            if msg.contains("foreign key constraint fails") {
                return ApiError::BadRequest("referencia a un registro inexistente".to_string());
            }
            if msg.contains("Data too long") {
                return ApiError::BadRequest(format!(
                    "{} excede el largo permitido",
                    column_name(&msg)
                ));
            }
            if msg.contains("Out of range value") {
                return ApiError::BadRequest(format!("{} fuera de rango", column_name(&msg)));
            }
        }
        match err {
            mantis_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            mantis_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            mantis_core::Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other),
        }
    }
}

/// Column named in a MySQL "... for column 'x' ..." message.
fn column_name(msg: &str) -> &str {
    msg.split("column '")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .unwrap_or("valor")
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Cuerpo JSON inválido: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Parámetro de ruta inválido: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Parámetros de consulta inválidos: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": msg }),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": msg }),
            ),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                json!({ "success": false, "message": msg }),
            ),
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                let body = if EXPOSE_ERROR_DETAIL.load(Ordering::Relaxed) {
                    json!({
                        "success": false,
                        "message": INTERNAL_ERROR_MESSAGE,
                        "error": err.to_string(),
                    })
                } else {
                    json!({ "success": false, "message": INTERNAL_ERROR_MESSAGE })
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

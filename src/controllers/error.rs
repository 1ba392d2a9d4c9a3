use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::ServiceError;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServiceError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({"success": false, "error": msg})))
            }
            ServiceError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({"success": false, "error": msg})))
            }
            // cause is already logged by the service
            ServiceError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": "database error"})),
            ),
            ServiceError::Auth => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"valid": false, "error": "invalid access code"})),
            ),
        };
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

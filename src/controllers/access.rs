use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::services::ServiceError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/verify-code", post(verify_code))
}

#[derive(Debug, Default, Deserialize)]
struct VerifyCodeRequest {
    #[serde(default)]
    code: String,
}

// POST /verify-code
async fn verify_code(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    // an unreadable body is just a wrong code
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let valid = state.tickets.verify_code(&req.code)?;
    Ok(Json(json!({"valid": valid})))
}

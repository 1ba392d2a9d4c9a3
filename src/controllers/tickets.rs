use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::{Ticket, TicketPayload};
use crate::services::ServiceError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/boletas", get(list_tickets).post(upsert_ticket))
        .route("/boletas/{number}", delete(delete_ticket))
}

// GET /boletas
async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Ticket>>, ServiceError> {
    Ok(Json(state.tickets.list().await?))
}

// POST /boletas
async fn upsert_ticket(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TicketPayload>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let Json(payload) = body?;
    state.tickets.upsert(payload).await?;
    Ok(Json(json!({"success": true})))
}

// DELETE /boletas/{number}
async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    state.tickets.delete(&number).await?;
    Ok(Json(json!({"success": true})))
}

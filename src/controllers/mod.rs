pub mod access;
pub mod error;
pub mod tickets;
pub mod ws;

use axum::Router;
use std::sync::Arc;

use crate::realtime::Broadcaster;

pub fn routes(broadcaster: Option<Broadcaster>) -> Router<Arc<crate::AppState>> {
    let router = Router::new()
        .merge(tickets::routes())
        .merge(access::routes());

    match broadcaster {
        Some(broadcaster) => router.merge(ws::routes(broadcaster)),
        None => router,
    }
}

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::realtime::Broadcaster;
use crate::AppState;

/// Mounted only when real-time broadcasting is enabled.
pub fn routes(broadcaster: Broadcaster) -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(broadcaster)
}

// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(broadcaster): State<Broadcaster>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Broadcaster) {
    debug!("WebSocket subscriber connected");
    let (mut sender, mut receiver) = socket.split();
    let mut events = broadcaster.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => debug!("WebSocket subscriber lagged by {} events", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // subscribers only listen; drain until the client goes away
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    debug!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("WebSocket subscriber disconnected");
}

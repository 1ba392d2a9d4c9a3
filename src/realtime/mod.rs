//! Push-only change notifications for connected WebSocket subscribers.
//!
//! Delivery is best-effort: publishing never waits on subscribers, nothing is
//! persisted, and a subscriber that connects late or lags behind the buffer
//! simply misses those events.

pub mod redis_bridge;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::models::Ticket;
use crate::redis_client::RedisClient;

/// Redis pub/sub channel shared by every instance.
pub const EVENTS_CHANNEL: &str = "boletas:events";

/// Wire format: `{"event": "ticketUpdated", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum TicketEvent {
    TicketUpdated(Ticket),
    TicketDeleted { number: String },
}

#[derive(Clone)]
pub struct Broadcaster {
    local: broadcast::Sender<TicketEvent>,
    // Queue of the single Redis publisher task; events leave in publish order.
    outbound: Option<mpsc::UnboundedSender<TicketEvent>>,
}

impl Broadcaster {
    /// Single-instance fan-out.
    pub fn new(capacity: usize) -> Self {
        let (local, _) = broadcast::channel(capacity.max(1));
        Self { local, outbound: None }
    }

    /// Fan-out through Redis. Local subscribers are fed by the bridge task,
    /// so events published here come back exactly once.
    pub fn with_redis(capacity: usize, redis: RedisClient) -> Self {
        let mut broadcaster = Self::new(capacity);
        redis_bridge::spawn(redis.client.clone(), broadcaster.local.clone());
        broadcaster.outbound = Some(redis_bridge::spawn_publisher(
            redis.conn.clone(),
            broadcaster.local.clone(),
        ));
        broadcaster
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.local.subscribe()
    }

    pub fn publish(&self, event: TicketEvent) {
        match &self.outbound {
            None => self.deliver_local(event),
            Some(outbound) => {
                if let Err(mpsc::error::SendError(event)) = outbound.send(event) {
                    warn!("Redis publisher stopped, delivering locally only");
                    self.deliver_local(event);
                }
            }
        }
    }

    fn deliver_local(&self, event: TicketEvent) {
        deliver(&self.local, event);
    }
}

pub(crate) fn deliver(local: &broadcast::Sender<TicketEvent>, event: TicketEvent) {
    // Err only means nobody is listening right now
    match local.send(event) {
        Ok(n) => debug!("Event delivered to {} subscribers", n),
        Err(_) => debug!("Event dropped, no subscribers"),
    }
}

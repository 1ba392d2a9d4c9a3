use futures::StreamExt;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{error, info, warn};

use super::{deliver, TicketEvent, EVENTS_CHANNEL};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Returns how many subscribers Redis handed the event to.
pub async fn publish(conn: &mut MultiplexedConnection, event: &TicketEvent) -> redis::RedisResult<i64> {
    let payload = serde_json::to_string(event).map_err(|_| {
        redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
    })?;
    conn.publish(EVENTS_CHANNEL, payload).await
}

/// Starts the one task that publishes to Redis. Events are sent one at a
/// time in queue order. When Redis fails or nobody is subscribed (our own
/// bridge may be resubscribing), the event goes to local subscribers directly.
pub fn spawn_publisher(
    mut conn: MultiplexedConnection,
    local: broadcast::Sender<TicketEvent>,
) -> mpsc::UnboundedSender<TicketEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<TicketEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let result = publish(&mut conn, &event).await;
            match &result {
                Ok(0) => warn!("No subscribers on {}, delivering locally", EVENTS_CHANNEL),
                Err(e) => warn!("Redis publish failed, delivering locally only: {:?}", e),
                Ok(_) => {}
            }
            if needs_local_delivery(&result) {
                deliver(&local, event);
            }
        }
    });
    tx
}

fn needs_local_delivery(result: &redis::RedisResult<i64>) -> bool {
    !matches!(result, Ok(n) if *n > 0)
}

pub fn decode(payload: &str) -> Option<TicketEvent> {
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Ignoring malformed event on {}: {}", EVENTS_CHANNEL, e);
            None
        }
    }
}

/// Forwards every event on the shared channel into the local broadcaster,
/// resubscribing after connection loss.
pub fn spawn(client: Client, local: broadcast::Sender<TicketEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match forward(&client, &local).await {
                Ok(()) => warn!("Redis event stream ended, resubscribing"),
                Err(e) => error!("Redis event bridge failed: {:?}", e),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

async fn forward(client: &Client, local: &broadcast::Sender<TicketEvent>) -> redis::RedisResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(EVENTS_CHANNEL).await?;
    info!("Subscribed to {}", EVENTS_CHANNEL);

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!("Unreadable payload on {}: {:?}", EVENTS_CHANNEL, e);
                continue;
            }
        };
        if let Some(event) = decode(&payload) {
            let _ = local.send(event);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_events_published_by_other_instances() {
        let event = decode(r#"{"event":"ticketDeleted","data":{"number":"12"}}"#);
        assert_eq!(event, Some(TicketEvent::TicketDeleted { number: "12".into() }));
    }

    #[test]
    fn unheard_or_failed_publishes_fall_back_to_local_delivery() {
        assert!(needs_local_delivery(&Ok(0)));
        assert!(!needs_local_delivery(&Ok(2)));
        let failed = Err(redis::RedisError::from((redis::ErrorKind::IoError, "connection reset")));
        assert!(needs_local_delivery(&failed));
    }

    #[test]
    fn malformed_payloads_are_skipped() {
        assert_eq!(decode("not json"), None);
        assert_eq!(decode(r#"{"event":"ticketSold","data":{}}"#), None);
    }
}

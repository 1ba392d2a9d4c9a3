use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{StoreError, TicketStore, UpsertOutcome};
use crate::models::Ticket;

/// Process-local store used when no database is configured, and by tests.
/// Rows are kept ordered by number.
#[derive(Clone, Default)]
pub struct MemoryTicketStore {
    rows: Arc<RwLock<BTreeMap<String, Ticket>>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn list(&self) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn find(&self, number: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self.rows.read().await.get(number).cloned())
    }

    async fn upsert_unless_locked(
        &self,
        ticket: &Ticket,
        paid_status: &str,
    ) -> Result<UpsertOutcome, StoreError> {
        // write guard held across check and write
        let mut rows = self.rows.write().await;
        let outcome = match rows.get(&ticket.number) {
            Some(existing) if existing.is_locked(paid_status) => return Ok(UpsertOutcome::Locked),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        rows.insert(ticket.number.clone(), ticket.clone());
        Ok(outcome)
    }

    async fn delete(&self, number: &str) -> Result<bool, StoreError> {
        Ok(self.rows.write().await.remove(number).is_some())
    }
}

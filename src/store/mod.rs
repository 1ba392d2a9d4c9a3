//! Persistence for the `boletas` table.
//!
//! Both implementations perform the sold-ticket check and the write as one
//! step, so two concurrent upserts can never both claim an unsold number.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Ticket;

pub use memory::MemoryTicketStore;
pub use postgres::PgTicketStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a conditional upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// The stored row is sold; nothing was written.
    Locked,
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Ticket>, StoreError>;

    async fn find(&self, number: &str) -> Result<Option<Ticket>, StoreError>;

    /// Inserts `ticket` or replaces every mutable field of the existing row,
    /// unless the existing row is locked under `paid_status`.
    async fn upsert_unless_locked(
        &self,
        ticket: &Ticket,
        paid_status: &str,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, number: &str) -> Result<bool, StoreError>;
}

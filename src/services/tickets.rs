use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::Validate;

use crate::models::{Ticket, TicketPayload};
use crate::realtime::{Broadcaster, TicketEvent};
use crate::store::{StoreError, TicketStore, UpsertOutcome};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid access code")]
    Auth,
}

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketStore>,
    broadcaster: Option<Broadcaster>,
    paid_status: String,
    access_code: String,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn TicketStore>,
        broadcaster: Option<Broadcaster>,
        paid_status: impl Into<String>,
        access_code: impl Into<String>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            paid_status: paid_status.into(),
            access_code: access_code.into().trim().to_string(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Ticket>, ServiceError> {
        self.store.list().await.map_err(|e| {
            error!("Failed to list tickets: {:?}", e);
            e.into()
        })
    }

    pub async fn upsert(&self, payload: TicketPayload) -> Result<Ticket, ServiceError> {
        payload
            .validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        let ticket = payload
            .into_ticket()
            .ok_or_else(|| ServiceError::Validation("number is required".to_string()))?;

        let outcome = self
            .store
            .upsert_unless_locked(&ticket, &self.paid_status)
            .await
            .map_err(|e| {
                error!("Failed to save ticket {}: {:?}", ticket.number, e);
                ServiceError::from(e)
            })?;

        match outcome {
            UpsertOutcome::Locked => {
                warn!("Rejected write to sold ticket {}", ticket.number);
                Err(ServiceError::Conflict(format!(
                    "ticket {} is already sold",
                    ticket.number
                )))
            }
            UpsertOutcome::Created | UpsertOutcome::Updated => {
                info!("Ticket {} saved ({:?})", ticket.number, outcome);
                self.publish(TicketEvent::TicketUpdated(ticket.clone()));
                Ok(ticket)
            }
        }
    }

    /// Deleting an absent number succeeds.
    pub async fn delete(&self, number: &str) -> Result<(), ServiceError> {
        let number = number.trim();
        let removed = self.store.delete(number).await.map_err(|e| {
            error!("Failed to delete ticket {}: {:?}", number, e);
            ServiceError::from(e)
        })?;

        if removed {
            info!("Ticket {} deleted", number);
        }
        self.publish(TicketEvent::TicketDeleted {
            number: number.to_string(),
        });
        Ok(())
    }

    /// Gate for destructive actions in the client. Not enforced by `upsert`
    /// or `delete`.
    pub fn verify_code(&self, code: &str) -> Result<bool, ServiceError> {
        if !self.access_code.is_empty() && code.trim() == self.access_code {
            Ok(true)
        } else {
            warn!("Access code verification failed");
            Err(ServiceError::Auth)
        }
    }

    fn publish(&self, event: TicketEvent) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.publish(event);
        }
    }
}

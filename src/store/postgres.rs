use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, TicketStore, UpsertOutcome};
use crate::models::Ticket;

#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn list(&self) -> Result<Vec<Ticket>, StoreError> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT number, client_name, phone, payment_status, amount_paid, seller
             FROM boletas
             ORDER BY number"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }

    async fn find(&self, number: &str) -> Result<Option<Ticket>, StoreError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            "SELECT number, client_name, phone, payment_status, amount_paid, seller
             FROM boletas
             WHERE number = $1"
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    async fn upsert_unless_locked(
        &self,
        ticket: &Ticket,
        paid_status: &str,
    ) -> Result<UpsertOutcome, StoreError> {
        // The conflict branch only fires while the stored row is not sold.
        // `xmax = 0` tells a fresh insert apart from an update.
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO boletas (number, client_name, phone, payment_status, amount_paid, seller)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (number) DO UPDATE SET
                client_name    = EXCLUDED.client_name,
                phone          = EXCLUDED.phone,
                payment_status = EXCLUDED.payment_status,
                amount_paid    = EXCLUDED.amount_paid,
                seller         = EXCLUDED.seller,
                updated_at     = NOW()
            WHERE NOT (
                COALESCE(BTRIM(boletas.client_name), '') <> ''
                AND boletas.payment_status IS NOT DISTINCT FROM $7
            )
            RETURNING (xmax = 0) AS inserted
            "#
        )
        .bind(&ticket.number)
        .bind(&ticket.client_name)
        .bind(&ticket.phone)
        .bind(&ticket.payment_status)
        .bind(ticket.amount_paid)
        .bind(&ticket.seller)
        .bind(paid_status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(true) => UpsertOutcome::Created,
            Some(false) => UpsertOutcome::Updated,
            None => UpsertOutcome::Locked,
        })
    }

    async fn delete(&self, number: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM boletas WHERE number = $1")
            .bind(number)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

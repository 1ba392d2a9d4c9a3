use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One raffle number and its sale state, as stored in `boletas`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub number: String,
    pub client_name: Option<String>,
    pub phone: Option<String>,
    pub payment_status: Option<String>,
    pub amount_paid: Option<f64>,
    pub seller: Option<String>,
}

impl Ticket {
    /// Sold tickets (a client name plus the paid marker) refuse further writes.
    /// Only spaces count as blank, matching `BTRIM` in the SQL store.
    pub fn is_locked(&self, paid_status: &str) -> bool {
        let has_client = self
            .client_name
            .as_deref()
            .is_some_and(|name| !name.trim_matches(' ').is_empty());
        has_client && self.payment_status.as_deref() == Some(paid_status)
    }
}

/// Body of `POST /boletas`. Also accepts the field names the raffle
/// front-end has always sent (`numero`, `cliente`, ...).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    #[serde(default, alias = "numero", deserialize_with = "number_or_string")]
    #[validate(length(max = 32))]
    pub number: Option<String>,
    #[serde(alias = "cliente")]
    #[validate(length(max = 120))]
    pub client_name: Option<String>,
    #[serde(alias = "celular")]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(alias = "pago")]
    #[validate(length(max = 32))]
    pub payment_status: Option<String>,
    #[serde(alias = "montoAbono")]
    #[validate(range(min = 0.0))]
    pub amount_paid: Option<f64>,
    #[serde(alias = "vendedor")]
    #[validate(length(max = 120))]
    pub seller: Option<String>,
}

impl TicketPayload {
    /// `None` when the number is missing or blank.
    pub fn into_ticket(self) -> Option<Ticket> {
        let number = self.number?.trim().to_string();
        if number.is_empty() {
            return None;
        }
        Some(Ticket {
            number,
            client_name: self.client_name,
            phone: self.phone,
            payment_status: self.payment_status,
            amount_paid: self.amount_paid,
            seller: self.seller,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawNumber>::deserialize(deserializer)?.map(|raw| match raw {
        RawNumber::Text(s) => s,
        RawNumber::Signed(n) => n.to_string(),
        RawNumber::Unsigned(n) => n.to_string(),
    }))
}

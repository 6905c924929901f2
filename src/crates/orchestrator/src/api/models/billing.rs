//! `/billing/*` request/response bodies (spec §6.1).

use serde::{Deserialize, Serialize};

/// An already-signature-verified Stripe event (spec §1: the core consumes
/// already-verified events; signature verification is an external
/// collaborator's job). `id` doubles as the webhook idempotency key and the
/// ledger's `external_event_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeWebhookRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeWebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeWebhookData {
    pub object: StripeWebhookObject,
}

/// Only the fields the event-type -> ledger mapping (SPEC_FULL §6.1) needs;
/// Stripe's real payloads carry much more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeWebhookObject {
    /// The account this event's credits/refund apply to. Stripe carries this
    /// as `client_reference_id`/`metadata.account_id` depending on event
    /// family; the already-verified event handed to the core is expected to
    /// have normalized it onto this field.
    pub account_id: String,
    /// Amount in the account's credit units (already converted from cents
    /// upstream).
    #[serde(default)]
    pub amount: Option<rust_decimal::Decimal>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAckResponse {
    pub status: &'static str,
    pub duplicate: bool,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub total: rust_decimal::Decimal,
    pub daily: rust_decimal::Decimal,
    pub expiring: rust_decimal::Decimal,
    pub non_expiring: rust_decimal::Decimal,
}

#[derive(Debug, Serialize)]
pub struct CreditSummaryResponse {
    pub account_id: String,
    pub balance: BalanceResponse,
}

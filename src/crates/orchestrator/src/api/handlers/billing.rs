//! `/billing/*` handlers (spec §6.1): Stripe webhook ingestion and
//! read-only balance inspection over `CreditLedger`.

use axum::extract::State;
use axum::Json;
use credit_ledger::LedgerEntryType;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{
    BalanceResponse, CreditSummaryResponse, StripeWebhookRequest,
};
use crate::api::models::billing::WebhookAckResponse;
use crate::auth::AuthUser;
use crate::core::Core;

/// `POST /billing/webhooks/stripe`. Idempotent on `id` via `WebhookStore`;
/// the event-type -> ledger-entry-type mapping is SPEC_FULL §6.1's:
/// `checkout.session.completed` -> purchase (non-expiring),
/// `invoice.payment_succeeded` -> grant (expiring, via `reset_expiring`),
/// `charge.refunded` -> refund (non-expiring), `customer.subscription.deleted`
/// updates no ledger entry (a payment status flag only, out of scope here).
pub async fn stripe_webhook(
    State(core): State<Core>,
    Json(event): Json<StripeWebhookRequest>,
) -> ApiResult<Json<WebhookAckResponse>> {
    let payload = serde_json::to_value(&event)?;
    let outcome = core
        .webhooks
        .check_and_mark_processing(&event.id, &event.event_type, &payload)
        .await?;

    match outcome {
        credit_ledger::WebhookOutcome::AlreadyCompleted => {
            return Ok(Json(WebhookAckResponse { status: "ok", duplicate: true }));
        }
        credit_ledger::WebhookOutcome::InProgress => {
            return Err(ApiError::Conflict(format!(
                "webhook event {} is already being processed",
                event.id
            )));
        }
        credit_ledger::WebhookOutcome::Proceed => {}
    }

    let result = apply_event(&core, &event).await;

    match &result {
        Ok(()) => core.webhooks.mark_completed(&event.id).await?,
        Err(e) => core.webhooks.mark_failed(&event.id, &e.to_string()).await?,
    }
    result?;

    Ok(Json(WebhookAckResponse { status: "ok", duplicate: false }))
}

async fn apply_event(core: &Core, event: &StripeWebhookRequest) -> ApiResult<()> {
    let account_id = &event.data.object.account_id;
    let amount = event.data.object.amount.unwrap_or_default();

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            core.credits
                .add(
                    account_id,
                    amount,
                    false,
                    None,
                    Some(&event.id),
                    LedgerEntryType::Purchase,
                    "stripe checkout completed",
                )
                .await?;
        }
        "invoice.payment_succeeded" => {
            core.credits
                .reset_expiring(account_id, amount, Some(&event.id))
                .await?;
        }
        "charge.refunded" => {
            core.credits
                .add(
                    account_id,
                    amount,
                    false,
                    None,
                    Some(&event.id),
                    LedgerEntryType::Refund,
                    "stripe charge refunded",
                )
                .await?;
        }
        "customer.subscription.deleted" => {
            // Payment status flag only; no ledger entry (SPEC_FULL §6.1).
        }
        other => {
            return Err(ApiError::BadRequest(format!("unhandled stripe event type: {other}")));
        }
    }

    Ok(())
}

/// `GET /billing/credits/balance` — the caller's own balance.
pub async fn balance(
    State(core): State<Core>,
    auth: AuthUser,
) -> ApiResult<Json<BalanceResponse>> {
    let summary = core.credits.balance(&auth.user_id).await?;
    Ok(Json(BalanceResponse {
        total: summary.total,
        daily: summary.daily,
        expiring: summary.expiring,
        non_expiring: summary.non_expiring,
    }))
}

/// `GET /billing/credits/summary` — the caller's balance plus account id.
pub async fn credit_summary(
    State(core): State<Core>,
    auth: AuthUser,
) -> ApiResult<Json<CreditSummaryResponse>> {
    let summary = core.credits.balance(&auth.user_id).await?;
    Ok(Json(CreditSummaryResponse {
        account_id: auth.user_id,
        balance: BalanceResponse {
            total: summary.total,
            daily: summary.daily,
            expiring: summary.expiring,
            non_expiring: summary.non_expiring,
        },
    }))
}

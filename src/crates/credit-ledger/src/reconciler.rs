//! Periodic reconciliation: orphan payment recovery, balance repair,
//! duplicate detection, and expiry sweep (spec §4.5).

use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::{info, warn};

use crate::error::Result;
use crate::ledger::{warn_drift, CreditLedger};
use crate::model::LedgerEntryType;

/// External payment provider lookup, consumed (not implemented) by the
/// orphan-recovery pass. The core only needs to know whether a pending
/// purchase succeeded; verifying the provider's response is the caller's
/// concern (payment-provider webhook signature verification is out of
/// scope, see spec §1).
#[async_trait::async_trait]
pub trait ExternalPaymentProvider: Send + Sync {
    async fn succeeded(&self, external_event_id: &str) -> bool;
}

pub struct ReconcilerConfig {
    /// How far back to look for orphaned pending purchases.
    pub orphan_window_hours: i64,
    /// Balance drift tolerance before a repair is logged and applied.
    pub drift_tolerance: Decimal,
    /// Window for flagging repeated (account, amount, description) entries.
    pub duplicate_window_seconds: i64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        // Open question in spec §9: the window is configurable but
        // unbounded in the source; 24h is the documented safe default.
        Self {
            orphan_window_hours: 24,
            drift_tolerance: Decimal::new(1, 2), // 0.01
            duplicate_window_seconds: 60,
        }
    }
}

pub struct Reconciler<P: ExternalPaymentProvider> {
    pool: PgPool,
    ledger: std::sync::Arc<dyn CreditLedger>,
    provider: P,
    config: ReconcilerConfig,
}

impl<P: ExternalPaymentProvider> Reconciler<P> {
    pub fn new(
        pool: PgPool,
        ledger: std::sync::Arc<dyn CreditLedger>,
        provider: P,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            pool,
            ledger,
            provider,
            config,
        }
    }

    /// Runs all four passes in sequence. Each pass is independent; a
    /// failure in one does not prevent the others from running.
    pub async fn run(&self) {
        if let Err(e) = self.recover_orphans().await {
            warn!(error = %e, "orphan recovery pass failed");
        }
        if let Err(e) = self.repair_balances().await {
            warn!(error = %e, "balance repair pass failed");
        }
        if let Err(e) = self.detect_duplicates().await {
            warn!(error = %e, "duplicate detection pass failed");
        }
        if let Err(e) = self.sweep_expired().await {
            warn!(error = %e, "expiry sweep pass failed");
        }
    }

    async fn recover_orphans(&self) -> Result<()> {
        let cutoff = Utc::now() - ChronoDuration::hours(self.config.orphan_window_hours);
        let rows = sqlx::query(
            r#"SELECT account_id, external_event_id, amount
               FROM pending_purchases
               WHERE created_at < $1 AND resolved = false"#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let account_id: String = row.get("account_id");
            let event_id: String = row.get("external_event_id");
            let amount: Decimal = row.get("amount");

            if !self.provider.succeeded(&event_id).await {
                continue;
            }

            let already_applied =
                sqlx::query("SELECT 1 as x FROM credit_ledger WHERE external_event_id = $1")
                    .bind(&event_id)
                    .fetch_optional(&self.pool)
                    .await?
                    .is_some();

            if already_applied {
                self.mark_resolved(&event_id).await?;
                continue;
            }

            self.ledger
                .add(
                    &account_id,
                    amount,
                    false,
                    None,
                    Some(&event_id),
                    LedgerEntryType::Purchase,
                    "orphan recovery: provider reports success",
                )
                .await?;
            self.mark_resolved(&event_id).await?;
            info!(account_id, event_id, "recovered orphaned payment");
        }

        Ok(())
    }

    async fn mark_resolved(&self, event_id: &str) -> Result<()> {
        sqlx::query("UPDATE pending_purchases SET resolved = true WHERE external_event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn repair_balances(&self) -> Result<()> {
        let rows = sqlx::query(
            "SELECT account_id, balance, daily_pool, expiring_pool, non_expiring_pool FROM credit_accounts",
        )
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let account_id: String = row.get("account_id");
            let balance: Decimal = row.get("balance");
            let daily: Decimal = row.get("daily_pool");
            let expiring: Decimal = row.get("expiring_pool");
            let non_expiring: Decimal = row.get("non_expiring_pool");
            let expected = daily + expiring + non_expiring;
            let drift = (balance - expected).abs();

            if drift > self.config.drift_tolerance {
                warn_drift(&account_id, expected, balance);
                sqlx::query("UPDATE credit_accounts SET balance = $1 WHERE account_id = $2")
                    .bind(expected)
                    .bind(&account_id)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    async fn detect_duplicates(&self) -> Result<()> {
        let window_start =
            Utc::now() - ChronoDuration::seconds(self.config.duplicate_window_seconds);
        let rows = sqlx::query(
            r#"SELECT account_id, amount_signed, description, COUNT(*) as occurrences
               FROM credit_ledger
               WHERE created_at > $1
               GROUP BY account_id, amount_signed, description
               HAVING COUNT(*) > 1"#,
        )
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let account_id: String = row.get("account_id");
            let description: String = row.get("description");
            let occurrences: i64 = row.get("occurrences");
            warn!(
                account_id,
                description, occurrences, "possible duplicate ledger entries detected"
            );
        }

        Ok(())
    }

    async fn sweep_expired(&self) -> Result<()> {
        let rows = sqlx::query(
            r#"SELECT account_id, expiring_pool FROM credit_accounts
               WHERE expiring_pool > 0 AND credit_expiry_date IS NOT NULL
                 AND credit_expiry_date < $1"#,
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let account_id: String = row.get("account_id");
            let expiring: Decimal = row.get("expiring_pool");
            self.ledger.reset_expiring(&account_id, Decimal::ZERO, None).await?;
            sqlx::query(
                r#"INSERT INTO credit_ledger
                     (id, account_id, amount_signed, balance_after, entry_type, description,
                      is_expiring, external_event_id, metadata, created_at)
                   SELECT $1, account_id, $2, balance, $3, 'expiring credit pool swept', true,
                          NULL, '{}'::jsonb, $4
                   FROM credit_accounts WHERE account_id = $5"#,
            )
            .bind(uuid::Uuid::new_v4())
            .bind(-expiring)
            .bind(LedgerEntryType::Expiry.as_str())
            .bind(Utc::now())
            .bind(&account_id)
            .execute(&self.pool)
            .await?;
            info!(account_id, %expiring, "swept expired credit pool");
        }

        Ok(())
    }
}

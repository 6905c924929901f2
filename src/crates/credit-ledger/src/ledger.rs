//! Priority-ordered, idempotent credit ledger backed by PostgreSQL.
//!
//! Each public operation runs as a single serializable transaction: the
//! account row is locked with `SELECT ... FOR UPDATE`, pools are read and
//! mutated, a ledger row is appended, and the transaction commits before
//! the balance cache is invalidated. This ordering is load-bearing: cache
//! invalidation must never precede commit, or a reader could observe a
//! stale balance as authoritative.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::model::{
    AccountId, AddResult, BalanceSummary, CreditAccount, DeductResult, DeductionBreakdown,
    LedgerEntryType,
};

const BALANCE_CACHE_TTL: Duration = Duration::from_secs(300);

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Adds credits to an account. Rejects `amount <= 0`. If
    /// `external_event_id` is already present in the ledger, returns
    /// `duplicate=true` with the current balance and applies nothing.
    async fn add(
        &self,
        account_id: &str,
        amount: Decimal,
        is_expiring: bool,
        expires_at: Option<chrono::DateTime<Utc>>,
        external_event_id: Option<&str>,
        entry_type: LedgerEntryType,
        description: &str,
    ) -> Result<AddResult>;

    /// Deducts credits in priority order daily -> expiring -> non_expiring.
    async fn deduct(
        &self,
        account_id: &str,
        amount: Decimal,
        description: &str,
        metadata: Option<serde_json::Value>,
        allow_negative: bool,
    ) -> Result<DeductResult>;

    /// Replaces `expiring_pool`, preserving `daily_pool`/`non_expiring_pool`.
    async fn reset_expiring(
        &self,
        account_id: &str,
        new_expiring: Decimal,
        external_event_id: Option<&str>,
    ) -> Result<()>;

    /// Current balance, served from a short-TTL cache when fresh.
    async fn balance(&self, account_id: &str) -> Result<BalanceSummary>;

    async fn ensure_account(&self, account_id: &str, tier: &str) -> Result<()>;
}

struct CachedBalance {
    summary: BalanceSummary,
    at: Instant,
}

pub struct PgCreditLedger {
    pool: PgPool,
    cache: Arc<RwLock<HashMap<AccountId, CachedBalance>>>,
}

impl PgCreditLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn invalidate(&self, account_id: &str) {
        self.cache.write().await.remove(account_id);
    }

    async fn load_account(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        account_id: &str,
    ) -> Result<CreditAccount> {
        let row = sqlx::query(
            r#"SELECT account_id, balance, daily_pool, expiring_pool, non_expiring_pool,
                      tier, payment_status, cycle_anchor, next_grant_at, credit_expiry_date
               FROM credit_accounts WHERE account_id = $1 FOR UPDATE"#,
        )
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        Ok(CreditAccount {
            account_id: row.get("account_id"),
            balance: row.get("balance"),
            daily_pool: row.get("daily_pool"),
            expiring_pool: row.get("expiring_pool"),
            non_expiring_pool: row.get("non_expiring_pool"),
            tier: row.get("tier"),
            payment_status: row.get("payment_status"),
            cycle_anchor: row.get("cycle_anchor"),
            next_grant_at: row.get("next_grant_at"),
            credit_expiry_date: row.get("credit_expiry_date"),
        })
    }

    async fn insert_ledger_entry(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        account_id: &str,
        amount_signed: Decimal,
        balance_after: Decimal,
        entry_type: LedgerEntryType,
        description: &str,
        is_expiring: bool,
        expires_at: Option<chrono::DateTime<Utc>>,
        external_event_id: Option<&str>,
        metadata: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO credit_ledger
                 (id, account_id, amount_signed, balance_after, entry_type, description,
                  is_expiring, expires_at, external_event_id, metadata, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(amount_signed)
        .bind(balance_after)
        .bind(entry_type.as_str())
        .bind(description)
        .bind(is_expiring)
        .bind(expires_at)
        .bind(external_event_id)
        .bind(metadata)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CreditLedger for PgCreditLedger {
    async fn add(
        &self,
        account_id: &str,
        amount: Decimal,
        is_expiring: bool,
        expires_at: Option<chrono::DateTime<Utc>>,
        external_event_id: Option<&str>,
        entry_type: LedgerEntryType,
        description: &str,
    ) -> Result<AddResult> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "add amount must be positive, got {amount}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        if let Some(event_id) = external_event_id {
            let existing = sqlx::query(
                "SELECT balance_after FROM credit_ledger WHERE external_event_id = $1",
            )
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some(row) = existing {
                tx.rollback().await?;
                info!(account_id, event_id, "duplicate add suppressed");
                return Ok(AddResult {
                    balance: row.get("balance_after"),
                    duplicate: true,
                });
            }
        }

        let mut account = Self::load_account(&mut tx, account_id).await?;
        if is_expiring {
            account.expiring_pool += amount;
        } else {
            account.non_expiring_pool += amount;
        }
        account.balance = account.pool_sum();

        sqlx::query(
            r#"UPDATE credit_accounts
               SET balance = $1, daily_pool = $2, expiring_pool = $3, non_expiring_pool = $4,
                   credit_expiry_date = COALESCE($5, credit_expiry_date)
               WHERE account_id = $6"#,
        )
        .bind(account.balance)
        .bind(account.daily_pool)
        .bind(account.expiring_pool)
        .bind(account.non_expiring_pool)
        .bind(expires_at)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        Self::insert_ledger_entry(
            &mut tx,
            account_id,
            amount,
            account.balance,
            entry_type,
            description,
            is_expiring,
            expires_at,
            external_event_id,
            serde_json::Value::Null,
        )
        .await?;

        tx.commit().await?;
        self.invalidate(account_id).await;

        Ok(AddResult {
            balance: account.balance,
            duplicate: false,
        })
    }

    async fn deduct(
        &self,
        account_id: &str,
        amount: Decimal,
        description: &str,
        metadata: Option<serde_json::Value>,
        allow_negative: bool,
    ) -> Result<DeductResult> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "deduct amount must be positive, got {amount}"
            )));
        }

        let mut tx = self.pool.begin().await?;
        let mut account = Self::load_account(&mut tx, account_id).await?;

        if account.balance < amount && !allow_negative {
            // balance < amount means draining every pool still falls short;
            // the breakdown reports what each pool currently holds.
            let breakdown = DeductionBreakdown {
                daily: account.daily_pool,
                expiring: account.expiring_pool,
                non_expiring: account.non_expiring_pool,
            };
            tx.rollback().await?;
            return Err(LedgerError::InsufficientCredits {
                required: amount,
                available: account.balance,
                breakdown,
            });
        }

        let mut remaining = amount;
        let mut breakdown = DeductionBreakdown::default();

        let from_daily = account.daily_pool.min(remaining);
        account.daily_pool -= from_daily;
        remaining -= from_daily;
        breakdown.daily = from_daily;

        let from_expiring = account.expiring_pool.min(remaining);
        account.expiring_pool -= from_expiring;
        remaining -= from_expiring;
        breakdown.expiring = from_expiring;

        let from_non_expiring = if allow_negative {
            remaining
        } else {
            account.non_expiring_pool.min(remaining)
        };
        account.non_expiring_pool -= from_non_expiring;
        remaining -= from_non_expiring;
        breakdown.non_expiring = from_non_expiring;

        if remaining > Decimal::ZERO && allow_negative {
            account.non_expiring_pool -= remaining;
            breakdown.non_expiring += remaining;
        }

        account.balance = account.pool_sum();

        sqlx::query(
            r#"UPDATE credit_accounts
               SET balance = $1, daily_pool = $2, expiring_pool = $3, non_expiring_pool = $4
               WHERE account_id = $5"#,
        )
        .bind(account.balance)
        .bind(account.daily_pool)
        .bind(account.expiring_pool)
        .bind(account.non_expiring_pool)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        let mut entry_metadata = metadata.unwrap_or_else(|| serde_json::json!({}));
        if let Some(obj) = entry_metadata.as_object_mut() {
            obj.insert("breakdown".into(), serde_json::to_value(&breakdown)?);
        }

        Self::insert_ledger_entry(
            &mut tx,
            account_id,
            -amount,
            account.balance,
            LedgerEntryType::Usage,
            description,
            false,
            None,
            None,
            entry_metadata,
        )
        .await?;

        tx.commit().await?;
        self.invalidate(account_id).await;

        Ok(DeductResult {
            balance: account.balance,
            breakdown,
        })
    }

    async fn reset_expiring(
        &self,
        account_id: &str,
        new_expiring: Decimal,
        external_event_id: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(event_id) = external_event_id {
            let existing =
                sqlx::query("SELECT 1 as x FROM credit_ledger WHERE external_event_id = $1")
                    .bind(event_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if existing.is_some() {
                tx.rollback().await?;
                return Ok(());
            }
        }

        let mut account = Self::load_account(&mut tx, account_id).await?;
        let delta = new_expiring - account.expiring_pool;
        account.expiring_pool = new_expiring;
        account.balance = account.pool_sum();

        sqlx::query(
            r#"UPDATE credit_accounts SET balance = $1, expiring_pool = $2 WHERE account_id = $3"#,
        )
        .bind(account.balance)
        .bind(account.expiring_pool)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        Self::insert_ledger_entry(
            &mut tx,
            account_id,
            delta,
            account.balance,
            LedgerEntryType::Grant,
            "monthly expiring credit renewal",
            true,
            None,
            external_event_id,
            serde_json::Value::Null,
        )
        .await?;

        tx.commit().await?;
        self.invalidate(account_id).await;
        Ok(())
    }

    async fn balance(&self, account_id: &str) -> Result<BalanceSummary> {
        if let Some(cached) = self.cache.read().await.get(account_id) {
            if cached.at.elapsed() < BALANCE_CACHE_TTL {
                return Ok(cached.summary);
            }
        }

        let row = sqlx::query(
            "SELECT balance, daily_pool, expiring_pool, non_expiring_pool FROM credit_accounts WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let summary = BalanceSummary {
            total: row.get("balance"),
            daily: row.get("daily_pool"),
            expiring: row.get("expiring_pool"),
            non_expiring: row.get("non_expiring_pool"),
        };

        self.cache.write().await.insert(
            account_id.to_string(),
            CachedBalance {
                summary,
                at: Instant::now(),
            },
        );

        Ok(summary)
    }

    async fn ensure_account(&self, account_id: &str, tier: &str) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO credit_accounts
                 (account_id, balance, daily_pool, expiring_pool, non_expiring_pool,
                  tier, payment_status, cycle_anchor)
               VALUES ($1, 0, 0, 0, 0, $2, 'active', $3)
               ON CONFLICT (account_id) DO NOTHING"#,
        )
        .bind(account_id)
        .bind(tier)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub fn warn_drift(account_id: &str, expected: Decimal, actual: Decimal) {
    warn!(account_id, %expected, %actual, "credit account balance drift detected");
}

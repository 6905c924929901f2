//! Data model for credit accounts and ledger entries.
//!
//! Mirrors the "Credit Account" and "Credit Ledger Entry" entities of the
//! runtime's data model: a balance split across three pools drained in
//! priority order (daily, then expiring, then non_expiring) and an
//! append-only ledger of signed amounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AccountId = String;

/// The kind of a ledger entry, used for reporting and reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Grant,
    Purchase,
    Usage,
    Refund,
    Expiry,
    Adjustment,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Grant => "grant",
            LedgerEntryType::Purchase => "purchase",
            LedgerEntryType::Usage => "usage",
            LedgerEntryType::Refund => "refund",
            LedgerEntryType::Expiry => "expiry",
            LedgerEntryType::Adjustment => "adjustment",
        }
    }
}

impl std::str::FromStr for LedgerEntryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "grant" => Ok(LedgerEntryType::Grant),
            "purchase" => Ok(LedgerEntryType::Purchase),
            "usage" => Ok(LedgerEntryType::Usage),
            "refund" => Ok(LedgerEntryType::Refund),
            "expiry" => Ok(LedgerEntryType::Expiry),
            "adjustment" => Ok(LedgerEntryType::Adjustment),
            other => Err(format!("unknown ledger entry type: {other}")),
        }
    }
}

/// Invariant: `balance == daily_pool + expiring_pool + non_expiring_pool`.
/// Enforced transactionally on every write; the reconciler repairs drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAccount {
    pub account_id: AccountId,
    pub balance: Decimal,
    pub daily_pool: Decimal,
    pub expiring_pool: Decimal,
    pub non_expiring_pool: Decimal,
    pub tier: String,
    pub payment_status: String,
    pub cycle_anchor: DateTime<Utc>,
    pub next_grant_at: Option<DateTime<Utc>>,
    pub credit_expiry_date: Option<DateTime<Utc>>,
}

impl CreditAccount {
    pub fn pool_sum(&self) -> Decimal {
        self.daily_pool + self.expiring_pool + self.non_expiring_pool
    }
}

/// An append-only ledger row. Ledger is total-ordered per account by
/// `(account_id, created_at)`; `external_event_id` is unique when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: AccountId,
    pub amount_signed: Decimal,
    pub balance_after: Decimal,
    pub entry_type: LedgerEntryType,
    pub description: String,
    pub is_expiring: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub external_event_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Per-pool amounts drawn by a `deduct` call, in priority order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    pub daily: Decimal,
    pub expiring: Decimal,
    pub non_expiring: Decimal,
}

impl DeductionBreakdown {
    pub fn total(&self) -> Decimal {
        self.daily + self.expiring + self.non_expiring
    }
}

#[derive(Debug, Clone)]
pub struct AddResult {
    pub balance: Decimal,
    pub duplicate: bool,
}

#[derive(Debug, Clone)]
pub struct DeductResult {
    pub balance: Decimal,
    pub breakdown: DeductionBreakdown,
}

#[derive(Debug, Clone, Copy)]
pub struct BalanceSummary {
    pub total: Decimal,
    pub daily: Decimal,
    pub expiring: Decimal,
    pub non_expiring: Decimal,
}

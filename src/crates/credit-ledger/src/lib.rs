//! Atomic, idempotent credit ledger with priority-ordered pools.
//!
//! An account holds three pools — `daily`, `expiring`, `non_expiring` —
//! drained in that order by [`ledger::CreditLedger::deduct`]. Every
//! mutation runs in a single serializable transaction that row-locks the
//! account, mutates pools, and appends an immutable ledger entry; a
//! separate [`reconciler::Reconciler`] repairs drift, recovers orphaned
//! payments, flags duplicate entries, and sweeps expired pools.
//!
//! ```rust,ignore
//! let ledger = PgCreditLedger::new(pool);
//! ledger.ensure_account("acct_1", "free").await?;
//! ledger.add("acct_1", dec!(10.00), false, None, None, LedgerEntryType::Grant, "signup bonus").await?;
//! let result = ledger.deduct("acct_1", dec!(0.05), "chat turn", None, false).await?;
//! ```

pub mod error;
pub mod ledger;
pub mod model;
pub mod reconciler;
pub mod webhook;

pub use error::{LedgerError, Result};
pub use ledger::{CreditLedger, PgCreditLedger};
pub use model::{
    AccountId, AddResult, BalanceSummary, CreditAccount, DeductResult, DeductionBreakdown,
    LedgerEntry, LedgerEntryType,
};
pub use reconciler::{ExternalPaymentProvider, Reconciler, ReconcilerConfig};
pub use webhook::{WebhookOutcome, WebhookStore};

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::model::DeductionBreakdown;

    /// Pure-function mirror of the priority deduction performed inside a
    /// transaction in `ledger.rs`, used to property-test invariant 1 of
    /// spec §8 (`balance == daily + expiring + non_expiring`) without a
    /// database.
    fn apply_deduction(
        daily: Decimal,
        expiring: Decimal,
        non_expiring: Decimal,
        amount: Decimal,
    ) -> Option<(Decimal, Decimal, Decimal, DeductionBreakdown)> {
        let balance = daily + expiring + non_expiring;
        if balance < amount {
            return None;
        }
        let mut remaining = amount;
        let from_daily = daily.min(remaining);
        remaining -= from_daily;
        let from_expiring = expiring.min(remaining);
        remaining -= from_expiring;
        let from_non_expiring = non_expiring.min(remaining);
        remaining -= from_non_expiring;
        debug_assert_eq!(remaining, Decimal::ZERO);

        Some((
            daily - from_daily,
            expiring - from_expiring,
            non_expiring - from_non_expiring,
            DeductionBreakdown {
                daily: from_daily,
                expiring: from_expiring,
                non_expiring: from_non_expiring,
            },
        ))
    }

    proptest! {
        #[test]
        fn pool_sum_equals_balance_after_deduction(
            daily in 0u32..10_000,
            expiring in 0u32..10_000,
            non_expiring in 0u32..10_000,
            amount in 0u32..20_000,
        ) {
            let daily = Decimal::new(daily as i64, 2);
            let expiring = Decimal::new(expiring as i64, 2);
            let non_expiring = Decimal::new(non_expiring as i64, 2);
            let amount = Decimal::new(amount as i64, 2);

            if amount == Decimal::ZERO {
                return Ok(());
            }

            if let Some((d, e, n, breakdown)) = apply_deduction(daily, expiring, non_expiring, amount) {
                prop_assert_eq!(d + e + n, daily + expiring + non_expiring - amount);
                prop_assert_eq!(breakdown.total(), amount);
            }
        }
    }
}

//! Ledger Invariant Checks
//!
//! Structural checks run over every computed ledger before it is persisted.
//! A violation here means the distribution silently misallocated money, so
//! the binary treats any violation as a runtime failure.
//!
//! # Checks
//!
//! - **Conservation**: sum of row amounts equals the pool within [`EPS`].
//! - **Cap enforcement**: per-wallet totals of waterfall rows stay at or
//!   under `pool * cap_pct`.
//! - **Proportionality**: uncapped waterfall rows within a wallet group pay
//!   pro-rata to units.
//! - **Share consistency**: `row.share == row.amount / pool` for a positive
//!   pool.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ledger::{CapReason, PayoutLedger};
use super::EPS;

/// One failed structural check.
#[derive(Debug, Clone, Serialize)]
pub struct InvariantViolation {
    pub check: &'static str,
    pub detail: String,
}

fn is_waterfall_row(reason: Option<CapReason>) -> bool {
    matches!(reason, None | Some(CapReason::WalletCap))
}

/// Run every structural check; an empty result means the ledger is sound.
pub fn check_ledger(ledger: &PayoutLedger, cap_pct: f64) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let pool = ledger.pool_usd;

    let total = ledger.total_allocated();
    if (total - pool).abs() > EPS {
        violations.push(InvariantViolation {
            check: "conservation",
            detail: format!("rows sum to {} but pool is {}", total, pool),
        });
    }

    if pool > EPS {
        let cap = pool * cap_pct;
        let mut per_wallet: BTreeMap<&str, f64> = BTreeMap::new();
        for row in &ledger.rows {
            if is_waterfall_row(row.cap_reason) {
                *per_wallet.entry(row.wallet.as_str()).or_insert(0.0) += row.amount_usd;
            }
        }
        for (wallet, amount) in &per_wallet {
            if *amount > cap + EPS {
                violations.push(InvariantViolation {
                    check: "wallet_cap",
                    detail: format!("wallet {} holds {} above cap {}", wallet, amount, cap),
                });
            }
        }

        for row in &ledger.rows {
            if (row.share - row.amount_usd / pool).abs() > EPS {
                violations.push(InvariantViolation {
                    check: "share_consistency",
                    detail: format!(
                        "row {}/{} share {} != amount {} / pool {}",
                        row.adm_code, row.wallet, row.share, row.amount_usd, pool
                    ),
                });
            }
        }

        // Proportionality of uncapped waterfall rows within each wallet group.
        let mut groups: BTreeMap<&str, Vec<&super::ledger::AllocationRow>> = BTreeMap::new();
        for row in &ledger.rows {
            if !row.capped && row.cap_reason.is_none() && row.units > 0 {
                groups.entry(row.wallet.as_str()).or_default().push(row);
            }
        }
        for (wallet, rows) in &groups {
            let group_amount: f64 = rows.iter().map(|r| r.amount_usd).sum();
            let group_units: u64 = rows.iter().map(|r| r.units).sum();
            if group_amount <= EPS || group_units == 0 {
                continue;
            }
            for row in rows {
                let amount_frac = row.amount_usd / group_amount;
                let unit_frac = row.units as f64 / group_units as f64;
                if (amount_frac - unit_frac).abs() > EPS {
                    violations.push(InvariantViolation {
                        check: "proportionality",
                        detail: format!(
                            "row {}/{} pays {} of its group but contributed {} of its units",
                            row.adm_code, wallet, amount_frac, unit_frac
                        ),
                    });
                }
            }
        }
    }

    violations
}

// =============================================================================
// TESTS
// =============================================================================

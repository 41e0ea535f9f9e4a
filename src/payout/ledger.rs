//! Payout Ledger Document
//!
//! Output row shape, row merging, ordering, and the serialized ledger
//! document handed to the ledger writer. Amounts stay full-precision floats
//! in memory; rounding (share 6dp, amount 2dp) happens only when the report
//! writer renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Why a row's amount was fixed outside plain proportional allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapReason {
    /// Amount decided before the waterfall ran.
    Carry,
    /// The row's wallet group hit the per-wallet cap.
    WalletCap,
    /// Residual pool routed to the operator after every group capped.
    CreatorOverflow,
    /// Residual pool with no configured destination.
    Unallocated,
    /// Earnings of wallet-less recipients redirected to the operator.
    NoWalletRedirect,
}

impl CapReason {
    pub fn as_str(&self) -> &str {
        match self {
            CapReason::Carry => "carry",
            CapReason::WalletCap => "wallet_cap",
            CapReason::CreatorOverflow => "creator_overflow",
            CapReason::Unallocated => "unallocated",
            CapReason::NoWalletRedirect => "no_wallet_redirect",
        }
    }
}

/// One ledger line: a recipient's payout for the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRow {
    pub adm_code: String,
    /// Wallet key (`"chain:address"`), the operator's adm code for carry and
    /// overflow rows, or empty for the UNALLOCATED pseudo-recipient.
    pub wallet: String,
    pub units: u64,
    /// Fraction of the pool, full precision.
    pub share: f64,
    pub amount_usd: f64,
    pub capped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_reason: Option<CapReason>,
}

/// Merge rows sharing the same `(adm_code, wallet)` key: sums units, shares,
/// and amounts, ORs the capped flag, keeps the first non-empty cap reason.
/// First-occurrence order is preserved.
pub fn merge_rows(rows: Vec<AllocationRow>) -> Vec<AllocationRow> {
    let mut merged: Vec<AllocationRow> = Vec::with_capacity(rows.len());
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for row in rows {
        let key = (row.adm_code.clone(), row.wallet.clone());
        match index.get(&key) {
            Some(&i) => {
                let prev = &mut merged[i];
                prev.units += row.units;
                prev.share += row.share;
                prev.amount_usd += row.amount_usd;
                prev.capped = prev.capped || row.capped;
                if prev.cap_reason.is_none() {
                    prev.cap_reason = row.cap_reason;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(row);
            }
        }
    }
    merged
}

/// Sort rows by descending amount for presentation. The sort is stable, so
/// ties keep insertion order; amounts are unaffected.
pub fn sort_rows(rows: &mut [AllocationRow]) {
    rows.sort_by(|a, b| {
        b.amount_usd
            .partial_cmp(&a.amount_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Audit metadata recorded alongside the rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMeta {
    pub total_units: u64,
    pub received_revenue_usd: f64,
    pub pool_cap_usd: f64,
    pub wallet_cap_pct: f64,
    pub creator_recipient: Option<String>,
    pub ramp_active: bool,
    pub zero_payout_phase: bool,
    /// Full-rate pool the formula would have paid without ramp-up.
    pub theoretical_pool_usd: f64,
    /// Ramp-up reserve diverted to the operator this period.
    pub reserve_usd: f64,
}

/// The complete ledger for one settlement period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutLedger {
    pub tag: String,
    /// Stamped by the report writer; the pure computation leaves it unset.
    #[serde(rename = "generatedAt")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(rename = "poolUSD")]
    pub pool_usd: f64,
    pub meta: LedgerMeta,
    pub rows: Vec<AllocationRow>,
}

impl PayoutLedger {
    pub fn total_allocated(&self) -> f64 {
        self.rows.iter().map(|r| r.amount_usd).sum()
    }
}

/// Render rows as the operations CSV: share at 6 decimals, amount at 2,
/// capped as 0/1.
pub fn rows_to_csv(rows: &[AllocationRow]) -> String {
    let mut out = String::from("adm_code,wallet,units,share,amount_usd,capped,cap_reason\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{:.6},{:.2},{},{}\n",
            row.adm_code,
            row.wallet,
            row.units,
            row.share,
            row.amount_usd,
            u8::from(row.capped),
            row.cap_reason.as_ref().map(|r| r.as_str()).unwrap_or(""),
        ));
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(adm: &str, wallet: &str, units: u64, amount: f64) -> AllocationRow {
        AllocationRow {
            adm_code: adm.to_string(),
            wallet: wallet.to_string(),
            units,
            share: amount / 100.0,
            amount_usd: amount,
            capped: false,
            cap_reason: None,
        }
    }

    #[test]
    fn test_merge_sums_and_ors() {
        let mut a = row("A", "eth:0x1", 10, 5.0);
        a.cap_reason = Some(CapReason::Carry);
        let mut b = row("A", "eth:0x1", 4, 3.0);
        b.capped = true;
        b.cap_reason = Some(CapReason::WalletCap);
        let merged = merge_rows(vec![a, b, row("B", "eth:0x2", 1, 1.0)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].units, 14);
        assert!((merged[0].amount_usd - 8.0).abs() < 1e-12);
        assert!(merged[0].capped);
        assert_eq!(merged[0].cap_reason, Some(CapReason::Carry));
    }

    #[test]
    fn test_merge_keeps_distinct_wallets_apart() {
        let merged = merge_rows(vec![row("A", "eth:0x1", 1, 1.0), row("A", "eth:0x2", 1, 1.0)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut rows = vec![row("A", "w1", 1, 2.0), row("B", "w2", 1, 5.0), row("C", "w3", 1, 2.0)];
        sort_rows(&mut rows);
        assert_eq!(rows[0].adm_code, "B");
        assert_eq!(rows[1].adm_code, "A");
        assert_eq!(rows[2].adm_code, "C");
    }

    #[test]
    fn test_csv_formatting() {
        let mut r = row("A", "eth:0x1", 3, 1.23456789);
        r.capped = true;
        r.cap_reason = Some(CapReason::WalletCap);
        let csv = rows_to_csv(&[r]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "adm_code,wallet,units,share,amount_usd,capped,cap_reason"
        );
        assert_eq!(lines.next().unwrap(), "A,eth:0x1,3,0.012346,1.23,1,wallet_cap");
    }
}

//! Capped Waterfall Distribution
//!
//! The core allocation algorithm: proportional distribution of the pool over
//! wallet groups with a per-wallet cap, iterative redistribution of capped
//! excess, and deterministic overflow routing.
//!
//! # Algorithm
//!
//! 1. Carry rows (amounts fixed before the waterfall, e.g. redirected
//!    unaddressed earnings) are emitted first and deducted from the pool.
//! 2. Stakes are grouped by wallet — one wallet may back several adm codes —
//!    and each round proposes `pool_remaining * group_units / remaining_units`
//!    per group.
//! 3. A round with no group over the cap finalizes every group at its
//!    proposal and terminates. Otherwise every over-cap group is finalized at
//!    exactly `cap` (split within the group by each member's units) and
//!    removed; survivors see a larger share next round.
//! 4. Pool left after all groups capped goes to the operator
//!    (`creator_overflow`) or to the [`UNALLOCATED`] pseudo-recipient.
//!
//! The cap is `pool * cap_pct`, computed once from the pool handed to this
//! stage; it does not shrink as rounds proceed.
//!
//! # Termination
//!
//! Every round either finishes with no group over cap (terminal case) or
//! removes at least one group from the remaining set, so the loop is bounded
//! by the number of wallet groups.
//!
//! Rounds are immutable transformations: each one consumes the remaining set
//! and produces a new finalized set and a new remaining set. No collection is
//! mutated while being iterated.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::ledger::{merge_rows, sort_rows, AllocationRow, CapReason};
use super::wallets::NO_WALLET;
use super::EPS;

/// Pseudo-recipient credited when funds have no valid destination, so the
/// ledger still balances to the pool total.
pub const UNALLOCATED: &str = "UNALLOCATED";

/// A recipient entering the distribution: canonical adm code, billable
/// units, resolved wallet key.
#[derive(Debug, Clone)]
pub struct RecipientStake {
    pub adm_code: String,
    pub units: u64,
    pub wallet: String,
}

/// An amount fixed outside the proportional waterfall.
#[derive(Debug, Clone)]
pub struct CarryRow {
    pub adm_code: String,
    pub wallet: String,
    pub amount_usd: f64,
    pub reason: CapReason,
}

/// Result of stripping wallet-less recipients from the distribution.
#[derive(Debug, Clone)]
pub struct Redirect {
    /// Stakes that proceed to the waterfall.
    pub addressed: Vec<RecipientStake>,
    /// Carry rows pre-assigning the redirected amount.
    pub carries: Vec<CarryRow>,
    /// USD stripped from the proportional distribution.
    pub redirected_usd: f64,
}

/// Remove the aggregate share of wallet-less recipients from the pool.
///
/// The share is the single division `no_wallet_units / total_units`, where
/// the denominator counts every recipient — proportional share is anchored
/// to total contribution, so units can never be laundered into a larger
/// share by withholding a wallet registration. When no recipient has any
/// units at all, the entire pool is unaddressed.
///
/// The redirected amount becomes a carry row for the operator when one is
/// configured; otherwise it is routed to [`UNALLOCATED`] so every dollar of
/// the pool still lands in exactly one ledger row.
pub fn redirect_unaddressed(
    stakes: Vec<RecipientStake>,
    pool_usd: f64,
    creator: Option<&str>,
) -> Redirect {
    let total_units: u64 = stakes.iter().map(|s| s.units).sum();
    let no_wallet_units: u64 = stakes
        .iter()
        .filter(|s| s.wallet == NO_WALLET)
        .map(|s| s.units)
        .sum();

    let redirected_usd = if total_units == 0 {
        pool_usd
    } else if no_wallet_units == 0 {
        0.0
    } else {
        pool_usd * (no_wallet_units as f64 / total_units as f64)
    };

    let addressed = stakes
        .into_iter()
        .filter(|s| s.wallet != NO_WALLET)
        .collect();

    let mut carries = Vec::new();
    if redirected_usd > EPS {
        match creator {
            Some(code) => carries.push(CarryRow {
                adm_code: code.to_string(),
                wallet: code.to_string(),
                amount_usd: redirected_usd,
                reason: CapReason::NoWalletRedirect,
            }),
            None => {
                warn!(
                    amount_usd = redirected_usd,
                    "no operator recipient configured; unaddressed earnings land in UNALLOCATED"
                );
                carries.push(CarryRow {
                    adm_code: UNALLOCATED.to_string(),
                    wallet: String::new(),
                    amount_usd: redirected_usd,
                    reason: CapReason::Unallocated,
                });
            }
        }
    }

    Redirect {
        addressed,
        carries,
        redirected_usd,
    }
}

/// One wallet's aggregate position in the waterfall.
#[derive(Debug, Clone)]
struct WalletGroup {
    units: u64,
    members: Vec<RecipientStake>,
}

fn group_by_wallet(stakes: Vec<RecipientStake>) -> Vec<WalletGroup> {
    // Sorted key order keeps cap rounds deterministic.
    let mut groups: BTreeMap<String, WalletGroup> = BTreeMap::new();
    for stake in stakes {
        let group = groups.entry(stake.wallet.clone()).or_insert_with(|| WalletGroup {
            units: 0,
            members: Vec::new(),
        });
        group.units += stake.units;
        group.members.push(stake);
    }
    groups.into_values().collect()
}

fn member_rows(
    group: &WalletGroup,
    group_amount: f64,
    pool_usd: f64,
    capped: bool,
    reason: Option<CapReason>,
) -> Vec<AllocationRow> {
    // Split within the group proportionally to each member's own units.
    group
        .members
        .iter()
        .map(|m| {
            let amount = if group.units == 0 {
                0.0
            } else {
                group_amount * (m.units as f64 / group.units as f64)
            };
            AllocationRow {
                adm_code: m.adm_code.clone(),
                wallet: m.wallet.clone(),
                units: m.units,
                share: amount / pool_usd,
                amount_usd: amount,
                capped,
                cap_reason: reason,
            }
        })
        .collect()
}

/// Allocate the pool across stakes under a per-wallet cap.
///
/// `pool_usd` is the full distributable pool for the period; carry rows are
/// paid out of it first. Never fails for business conditions — a zero pool,
/// no stakes, or an all-capped outcome each produce a valid ledger whose
/// rows sum to the pool. Returns merged rows sorted by descending amount.
pub fn distribute(
    stakes: Vec<RecipientStake>,
    pool_usd: f64,
    cap_pct: f64,
    carries: Vec<CarryRow>,
    creator: Option<&str>,
) -> Vec<AllocationRow> {
    // Zero pool: every stake still appears in the ledger, at $0.
    if pool_usd <= EPS {
        let mut rows = merge_rows(
            stakes
                .iter()
                .map(|s| AllocationRow {
                    adm_code: s.adm_code.clone(),
                    wallet: s.wallet.clone(),
                    units: s.units,
                    share: 0.0,
                    amount_usd: 0.0,
                    capped: false,
                    cap_reason: None,
                })
                .collect(),
        );
        sort_rows(&mut rows);
        return rows;
    }

    let cap = pool_usd * cap_pct;
    let mut pool_remaining = pool_usd;
    let mut finalized: Vec<AllocationRow> = Vec::new();

    for carry in &carries {
        let amount = carry.amount_usd.min(pool_remaining);
        finalized.push(AllocationRow {
            adm_code: carry.adm_code.clone(),
            wallet: carry.wallet.clone(),
            units: 0,
            share: amount / pool_usd,
            amount_usd: amount,
            capped: false,
            cap_reason: Some(carry.reason),
        });
        pool_remaining -= amount;
    }

    let mut remaining = group_by_wallet(stakes);
    let mut round = 0u32;
    while !remaining.is_empty() && pool_remaining > EPS {
        round += 1;
        let units_total: u64 = remaining.iter().map(|g| g.units).sum();
        if units_total == 0 {
            // No units left to anchor proportional math; remainder overflows.
            break;
        }

        let proposals: Vec<f64> = remaining
            .iter()
            .map(|g| pool_remaining * (g.units as f64 / units_total as f64))
            .collect();

        if proposals.iter().all(|&p| p <= cap + EPS) {
            // Terminal case: nobody over cap, assign as proposed.
            for (group, proposal) in remaining.iter().zip(&proposals) {
                finalized.extend(member_rows(group, *proposal, pool_usd, false, None));
            }
            pool_remaining = 0.0;
            remaining.clear();
            break;
        }

        let mut survivors = Vec::with_capacity(remaining.len());
        let mut capped_this_round = 0u32;
        for (group, proposal) in remaining.into_iter().zip(proposals) {
            if proposal > cap + EPS {
                finalized.extend(member_rows(
                    &group,
                    cap,
                    pool_usd,
                    true,
                    Some(CapReason::WalletCap),
                ));
                pool_remaining -= cap;
                capped_this_round += 1;
            } else {
                survivors.push(group);
            }
        }
        remaining = survivors;
        debug!(
            round,
            capped = capped_this_round,
            pool_remaining_usd = pool_remaining,
            "wallet cap round"
        );
    }

    if pool_remaining > EPS {
        // Every group capped (or no units at all) with funds left over.
        match creator {
            Some(code) => finalized.push(AllocationRow {
                adm_code: code.to_string(),
                wallet: code.to_string(),
                units: 0,
                share: pool_remaining / pool_usd,
                amount_usd: pool_remaining,
                capped: false,
                cap_reason: Some(CapReason::CreatorOverflow),
            }),
            None => {
                warn!(
                    amount_usd = pool_remaining,
                    "no operator recipient configured; residual pool lands in UNALLOCATED"
                );
                finalized.push(AllocationRow {
                    adm_code: UNALLOCATED.to_string(),
                    wallet: String::new(),
                    units: 0,
                    share: pool_remaining / pool_usd,
                    amount_usd: pool_remaining,
                    capped: false,
                    cap_reason: Some(CapReason::Unallocated),
                });
            }
        }
    }

    let mut rows = merge_rows(finalized);
    sort_rows(&mut rows);
    rows
}

//! Distributable Pool Calculation
//!
//! Derives the month's distributable USD pool from the verified revenue
//! figure: `pool = min(revenue * split_pct, hard_cap)`, with a bootstrap
//! ramp-up schedule that halves the split while the project builds reserve
//! and forces the earliest months to a $0 payout (units are still tracked
//! upstream, no money moves).
//!
//! The ramp phase is derived from the settlement period, never from the wall
//! clock, so the calculation stays a pure function of its inputs.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::period::SettlementPeriod;
use super::EPS;

/// Pool configuration: revenue split, hard cap, optional ramp-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Fraction of verified revenue entering the pool at full rate.
    pub split_pct: f64,
    /// Absolute monthly ceiling on the pool, in USD.
    pub hard_cap_usd: f64,
    pub ramp_up: Option<RampUpSchedule>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            split_pct: 0.13,
            hard_cap_usd: 10_000.0,
            ramp_up: Some(RampUpSchedule::default()),
        }
    }
}

/// Bootstrap ramp-up schedule.
///
/// Months are counted from the launch month, 1-based. While
/// `months_since_launch <= ramp_months` the reduced split applies; while
/// `months_since_launch <= zero_payout_months` the computed pool is forced to
/// exactly 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampUpSchedule {
    pub launch: DateTime<Utc>,
    pub ramp_months: u32,
    pub reduced_split_pct: f64,
    pub zero_payout_months: u32,
}

impl Default for RampUpSchedule {
    fn default() -> Self {
        Self {
            // Launched January 2026; first paid month is April 2026.
            launch: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            ramp_months: 3,
            reduced_split_pct: 0.065,
            zero_payout_months: 2,
        }
    }
}

/// Auditable result of the pool calculation.
///
/// `theoretical_usd` is what the full-rate formula would pay;
/// `distributed_usd` is what actually enters the distribution; the
/// difference is the reserve diverted to the operator during ramp-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolBreakdown {
    pub theoretical_usd: f64,
    pub distributed_usd: f64,
    pub reserve_usd: f64,
    pub ramp_active: bool,
    pub zero_payout_phase: bool,
    /// 1-based month count since launch, when a ramp-up is configured.
    pub months_since_launch: Option<i32>,
}

/// Compute the period's pool. Revenue of 0 (or a missing settlement treated
/// as 0 by the caller) yields a zero pool; the run still completes.
pub fn compute_pool(
    config: &PoolConfig,
    period: &SettlementPeriod,
    received_revenue_usd: f64,
) -> PoolBreakdown {
    let theoretical = (received_revenue_usd * config.split_pct).min(config.hard_cap_usd);

    let (ramp_active, zero_payout_phase, months_since_launch) = match &config.ramp_up {
        Some(ramp) => {
            let months = period.months_since(ramp.launch);
            let active = months >= 1 && months <= ramp.ramp_months as i32;
            let zeroed = months >= 1 && months <= ramp.zero_payout_months as i32;
            (active, zeroed, Some(months))
        }
        None => (false, false, None),
    };

    let split = if ramp_active {
        // Reduced split only exists inside a configured ramp.
        config
            .ramp_up
            .as_ref()
            .map(|r| r.reduced_split_pct)
            .unwrap_or(config.split_pct)
    } else {
        config.split_pct
    };

    let mut distributed = (received_revenue_usd * split).min(config.hard_cap_usd);
    if zero_payout_phase {
        distributed = 0.0;
    }
    if distributed < EPS {
        distributed = 0.0;
    }

    PoolBreakdown {
        theoretical_usd: theoretical,
        distributed_usd: distributed,
        reserve_usd: (theoretical - distributed).max(0.0),
        ramp_active,
        zero_payout_phase,
        months_since_launch,
    }
}

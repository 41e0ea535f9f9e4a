//! End-to-End Payout Pipeline
//!
//! Composes the stages into a single pure function: the same events,
//! revenue, wallet directory, and config always produce the identical
//! ledger. No I/O and no wall clock inside; `generated_at` stays unset until
//! the report writer stamps it.

use tracing::{debug, info};

use super::events::ImpressionEvent;
use super::filter::{aggregate_units, billable_events};
use super::ledger::{LedgerMeta, PayoutLedger};
use super::period::SettlementPeriod;
use super::pool::{compute_pool, PoolConfig};
use super::wallets::WalletDirectory;
use super::waterfall::{distribute, redirect_unaddressed, RecipientStake};
use super::EPS;

/// Pure computation config, independent of where values came from.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub pool: PoolConfig,
    /// Per-wallet cap as a fraction of the pool.
    pub wallet_cap_pct: f64,
    /// Operator adm code receiving redirects and overflow, if configured.
    pub creator_recipient: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            wallet_cap_pct: 0.01,
            creator_recipient: None,
        }
    }
}

/// Run the full computation for one settlement period.
pub fn run(
    period: &SettlementPeriod,
    events: &[ImpressionEvent],
    received_revenue_usd: f64,
    wallets: &WalletDirectory,
    config: &PipelineConfig,
) -> PayoutLedger {
    let billable = billable_events(events, period);
    let units = aggregate_units(billable.iter().copied());
    let total_units: u64 = units.values().sum();
    debug!(
        raw_events = events.len(),
        billable = billable.len(),
        recipients = units.len(),
        "events filtered and aggregated"
    );

    let breakdown = compute_pool(&config.pool, period, received_revenue_usd);
    let pool = breakdown.distributed_usd;

    let stakes: Vec<RecipientStake> = units
        .iter()
        .map(|(code, &n)| RecipientStake {
            adm_code: code.clone(),
            units: n,
            wallet: wallets.resolve(code).to_string(),
        })
        .collect();

    let creator = config.creator_recipient.as_deref();
    let rows = if pool <= EPS {
        // Tracking-only period: everyone appears, nothing moves.
        distribute(stakes, 0.0, config.wallet_cap_pct, Vec::new(), creator)
    } else {
        let redirect = redirect_unaddressed(stakes, pool, creator);
        if redirect.redirected_usd > EPS {
            debug!(
                redirected_usd = redirect.redirected_usd,
                "unaddressed earnings stripped from the waterfall"
            );
        }
        distribute(
            redirect.addressed,
            pool,
            config.wallet_cap_pct,
            redirect.carries,
            creator,
        )
    };

    let tag = period.tag();
    info!(
        %tag,
        total_units,
        pool_usd = pool,
        rows = rows.len(),
        "payout ledger computed"
    );

    PayoutLedger {
        tag,
        generated_at: None,
        pool_usd: pool,
        meta: LedgerMeta {
            total_units,
            received_revenue_usd,
            pool_cap_usd: config.pool.hard_cap_usd,
            wallet_cap_pct: config.wallet_cap_pct,
            creator_recipient: config.creator_recipient.clone(),
            ramp_active: breakdown.ramp_active,
            zero_payout_phase: breakdown.zero_payout_phase,
            theoretical_pool_usd: breakdown.theoretical_usd,
            reserve_usd: breakdown.reserve_usd,
        },
        rows,
    }
}

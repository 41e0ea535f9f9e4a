//! Monthly Payout Ledger Pipeline
//!
//! Deterministic batch computation that turns a month of raw ad-impression
//! events into a capped, auditable distribution of the revenue pool.
//!
//! # Architecture
//!
//! ```text
//! events CSV ──▶ EventFilter ──▶ UnitAggregator ──────────┐
//!                                                         ▼
//! settlement ──▶ PoolCalculator ────────────────▶ ┌──────────────────┐
//!                                                 │ CappedWaterfall  │──▶ PayoutLedger
//! wallets CSV ─▶ WalletDirectory ─▶ Redirector ─▶ └──────────────────┘
//! ```
//!
//! Data flows strictly left to right; no stage feeds back into the event
//! stream. Each settlement period is computed independently.
//!
//! # Determinism Guarantees
//!
//! - No wall-clock reads inside the pipeline; `generated_at` is stamped by
//!   the report writer, not the computation.
//! - `BTreeMap` aggregation: identical event multisets produce identical
//!   ledgers regardless of feed order.
//! - Wallet groups are processed in sorted key order, so cap rounds resolve
//!   identically across runs.
//! - A single epsilon constant ([`EPS`]) for every float comparison.

pub mod events;
pub mod filter;
pub mod invariants;
pub mod ledger;
pub mod period;
pub mod pipeline;
pub mod pool;
pub mod wallets;
pub mod waterfall;

#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod pool_tests;

pub use events::{EventKind, ImpressionEvent};
pub use filter::{aggregate_units, billable_events, RecipientUnits};
pub use invariants::{check_ledger, InvariantViolation};
pub use ledger::{AllocationRow, CapReason, LedgerMeta, PayoutLedger};
pub use period::SettlementPeriod;
pub use pipeline::{run, PipelineConfig};
pub use pool::{compute_pool, PoolBreakdown, PoolConfig, RampUpSchedule};
pub use wallets::{WalletDirectory, NO_WALLET};
pub use waterfall::{distribute, redirect_unaddressed, RecipientStake, UNALLOCATED};

/// Absolute epsilon for all floating-point comparisons in the payout
/// pipeline. Amounts are USD floats; anything below this is treated as zero.
pub const EPS: f64 = 1e-9;

//! Event Filter and Unit Aggregator
//!
//! Stages 1 and 2 of the payout pipeline. Both are pure functions: the same
//! event multiset always produces the same unit counts, regardless of feed
//! order. Events failing any criterion drop silently — a month with no
//! billable units is a valid outcome, not an error.

use std::collections::BTreeMap;

use super::events::ImpressionEvent;
use super::period::SettlementPeriod;

/// Units per canonical adm code. `BTreeMap` iteration keeps every later
/// stage deterministic. Recipients with zero surviving events never appear.
pub type RecipientUnits = BTreeMap<String, u64>;

/// Select the billable events for a settlement period.
///
/// An event survives when its type is billable, it was viewable, it was not
/// fraud-flagged, its timestamp falls inside the half-open period, and it
/// carries a non-empty adm code.
pub fn billable_events<'a>(
    events: &'a [ImpressionEvent],
    period: &SettlementPeriod,
) -> Vec<&'a ImpressionEvent> {
    events
        .iter()
        .filter(|ev| {
            ev.kind.is_billable()
                && ev.viewable
                && !ev.fraud_flagged
                && period.contains(ev.timestamp)
                && ev.adm_code.as_deref().is_some_and(|c| !c.is_empty())
        })
        .collect()
}

/// Count surviving events per adm code ("units").
pub fn aggregate_units<'a>(
    events: impl IntoIterator<Item = &'a ImpressionEvent>,
) -> RecipientUnits {
    let mut units = RecipientUnits::new();
    for ev in events {
        if let Some(code) = ev.adm_code.as_deref() {
            *units.entry(code.to_string()).or_insert(0) += 1;
        }
    }
    units
}

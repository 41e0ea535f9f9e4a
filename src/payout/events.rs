//! Impression Event Parsing
//!
//! Converts raw collector feed rows into typed [`ImpressionEvent`]s at the
//! pipeline boundary. Parsing is strict: a row that cannot be attributed to a
//! point in time is dropped with a debug log instead of letting
//! partially-parsed fields leak into aggregation. A missing or unparseable
//! UTM blob is not malformed — the event simply carries no adm code and the
//! filter discards it later.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Event types emitted by the browser-side collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An ad slot requested a creative.
    AdRequest,
    /// The creative met the viewability threshold.
    AdViewable,
    /// Any other collector event (engagement pings, consent changes, ...).
    Other,
}

impl EventKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "ad_request" => Self::AdRequest,
            "ad_viewable" => Self::AdViewable,
            _ => Self::Other,
        }
    }

    /// Only request/viewable events can ever bill a unit.
    pub fn is_billable(&self) -> bool {
        matches!(self, Self::AdRequest | Self::AdViewable)
    }
}

/// One observed ad-impression candidate. Immutable once parsed; the pipeline
/// only filters these, never mutates them.
#[derive(Debug, Clone)]
pub struct ImpressionEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    /// Canonical (uppercased) adm code extracted from the UTM blob, if any.
    pub adm_code: Option<String>,
    pub viewable: bool,
    pub fraud_flagged: bool,
}

/// UTM metadata blob carried on each collector event.
#[derive(Debug, Deserialize)]
struct UtmBlob {
    #[serde(default)]
    adm: Option<String>,
}

// Feed column layout:
// timestamp,type,sid_hash,page,slot,device,utm_json,viewable,ivt
const COL_TIMESTAMP: usize = 0;
const COL_TYPE: usize = 1;
const COL_UTM: usize = 6;
const COL_VIEWABLE: usize = 7;
const COL_IVT: usize = 8;
const FEED_COLUMNS: usize = 9;

fn parse_bool(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

fn extract_adm_code(utm_json: &str) -> Option<String> {
    let blob: UtmBlob = serde_json::from_str(utm_json).ok()?;
    let code = blob.adm?.trim().to_uppercase();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

impl ImpressionEvent {
    /// Parse one raw feed row. Returns `None` (after a debug log) when the
    /// row is too short or its timestamp does not parse.
    pub fn from_feed_row(row: &[String]) -> Option<Self> {
        if row.len() < FEED_COLUMNS {
            debug!(columns = row.len(), "dropping short event row");
            return None;
        }
        let timestamp = match row[COL_TIMESTAMP].parse::<DateTime<Utc>>() {
            Ok(ts) => ts,
            Err(_) => {
                debug!(raw = %row[COL_TIMESTAMP], "dropping event row with bad timestamp");
                return None;
            }
        };
        Some(Self {
            timestamp,
            kind: EventKind::parse(row[COL_TYPE].trim()),
            adm_code: extract_adm_code(&row[COL_UTM]),
            viewable: parse_bool(&row[COL_VIEWABLE]),
            fraud_flagged: parse_bool(&row[COL_IVT]),
        })
    }
}

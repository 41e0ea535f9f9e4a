//! External Data Feeds
//!
//! Collaborator I/O around the payout computation: fetching the exported
//! event and wallet sheets, parsing them, and reading the verified
//! settlement record. Nothing here is reachable from the pure pipeline — the
//! core only ever sees materialized values.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::payout::events::ImpressionEvent;
use crate::payout::wallets::WalletDirectory;

/// Fetch one exported sheet as text.
pub fn fetch_text(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .context("building http client")?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("fetching {}", url))?;
    response.text().context("reading sheet body")
}

/// Naive CSV split: strip surrounding quotes, split on commas. The exported
/// sheets never embed commas or quotes inside fields.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    text.trim()
        .lines()
        .map(|line| {
            line.split(',')
                .map(|field| field.trim_matches('"').to_string())
                .collect()
        })
        .collect()
}

/// Parse the events sheet (header row + data rows) into typed events.
/// Malformed rows are dropped by the event parser.
pub fn parse_event_rows(rows: &[Vec<String>]) -> Vec<ImpressionEvent> {
    rows.iter()
        .skip(1)
        .filter_map(|row| ImpressionEvent::from_feed_row(row))
        .collect()
}

// Wallet sheet column layout: ts,adm_code,chain,address,signature
const WALLET_COL_ADM: usize = 1;
const WALLET_COL_CHAIN: usize = 2;
const WALLET_COL_ADDRESS: usize = 3;

/// Parse the wallet registration sheet. Feed order matters: later rows for
/// the same adm code win.
pub fn parse_wallet_rows(rows: &[Vec<String>]) -> WalletDirectory {
    let mut dir = WalletDirectory::new();
    for row in rows.iter().skip(1) {
        if row.len() <= WALLET_COL_ADDRESS {
            continue;
        }
        dir.register(
            &row[WALLET_COL_ADM],
            &row[WALLET_COL_CHAIN],
            &row[WALLET_COL_ADDRESS],
        );
    }
    dir
}

/// Fetch and parse the wallet registration sheet. A fetch failure degrades
/// to an empty directory: the run proceeds and unmapped earnings redirect.
pub fn load_wallet_directory(url: Option<&str>) -> WalletDirectory {
    let Some(url) = url else {
        return WalletDirectory::new();
    };
    match fetch_text(url) {
        Ok(text) => {
            let dir = parse_wallet_rows(&parse_csv(&text));
            info!(wallets = dir.len(), "wallet directory loaded");
            dir
        }
        Err(err) => {
            warn!(error = %err, "wallet sheet fetch failed, proceeding without wallet map");
            WalletDirectory::new()
        }
    }
}

/// Verified revenue record for a settlement period.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementRecord {
    pub received_revenue_usd: f64,
}

/// Read `<dir>/<tag>.json`. `Ok(None)` when the record does not exist — the
/// caller decides whether that aborts the run.
pub fn read_settlement(dir: &Path, tag: &str) -> Result<Option<SettlementRecord>> {
    let path = dir.join(format!("{}.json", tag));
    if !path.exists() {
        return Ok(None);
    }
    let text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let record =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(record))
}

// =============================================================================
// TESTS
// =============================================================================

//! Ledger Writer
//!
//! Persists a computed ledger under `<out_dir>/<tag>/` as both pretty JSON
//! and the operations CSV. The writer stamps `generated_at`; the computation
//! itself never reads the clock, so re-running a period leaves the amounts
//! byte-identical and only this stamp differs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::payout::ledger::{rows_to_csv, PayoutLedger};

/// Write `ledger.json` and `ledger.csv`; returns the period's output dir.
pub fn write_ledger(out_dir: &Path, ledger: &PayoutLedger) -> Result<PathBuf> {
    let dir = out_dir.join(&ledger.tag);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut stamped = ledger.clone();
    stamped.generated_at = Some(Utc::now());

    let json_path = dir.join("ledger.json");
    let file =
        File::create(&json_path).with_context(|| format!("creating {}", json_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &stamped).context("serializing ledger")?;
    writer.write_all(b"\n").context("writing ledger json")?;
    writer.flush().context("flushing ledger json")?;

    let csv_path = dir.join("ledger.csv");
    fs::write(&csv_path, rows_to_csv(&stamped.rows))
        .with_context(|| format!("writing {}", csv_path.display()))?;

    info!(path = %dir.display(), rows = stamped.rows.len(), "ledger written");
    Ok(dir)
}

// =============================================================================
// TESTS
// =============================================================================

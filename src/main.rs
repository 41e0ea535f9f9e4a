//! Monthly Payout Computation CLI
//!
//! Fetches the period's impression events and wallet registrations, reads
//! the verified settlement record, runs the payout pipeline, verifies the
//! ledger invariants, and writes `payouts/<tag>/ledger.{json,csv}`.
//!
//! # Usage
//!
//! ```bash
//! SHEET_EVENTS_CSV_URL=https://... \
//! SHEET_WALLETS_CSV_URL=https://... \
//! CREATOR_ADM_CODE=FNDR \
//! cargo run --bin compute_payouts -- --period 2026-03
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success, ledger written
//! - 1: Configuration error (missing events URL, bad flags)
//! - 2: Missing settlement record for the period
//! - 3: Runtime error (fetch/IO failure, invariant violation)

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use admension_backend::feeds;
use admension_backend::models::PayoutConfig;
use admension_backend::payout::{check_ledger, pipeline, SettlementPeriod};
use admension_backend::report;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================

#[derive(Debug, Clone, Default)]
struct CliArgs {
    period: Option<String>,
    events_url: Option<String>,
    wallets_url: Option<String>,
    settlements_dir: Option<String>,
    out_dir: Option<String>,
    verbose: bool,
}

impl CliArgs {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut parsed = Self::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--period" | "-p" => {
                    i += 1;
                    parsed.period =
                        Some(args.get(i).ok_or("--period requires YYYY-MM")?.clone());
                }
                "--events-url" => {
                    i += 1;
                    parsed.events_url =
                        Some(args.get(i).ok_or("--events-url requires a URL")?.clone());
                }
                "--wallets-url" => {
                    i += 1;
                    parsed.wallets_url =
                        Some(args.get(i).ok_or("--wallets-url requires a URL")?.clone());
                }
                "--settlements-dir" => {
                    i += 1;
                    parsed.settlements_dir = Some(
                        args.get(i)
                            .ok_or("--settlements-dir requires a path")?
                            .clone(),
                    );
                }
                "--out-dir" | "-o" => {
                    i += 1;
                    parsed.out_dir =
                        Some(args.get(i).ok_or("--out-dir requires a path")?.clone());
                }
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => return Err(format!("unknown argument: {}", other)),
            }
            i += 1;
        }
        Ok(parsed)
    }
}

fn print_usage() {
    eprintln!("Usage: compute_payouts [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --period YYYY-MM      Settlement period (default: previous UTC month)");
    eprintln!("      --events-url URL      Events sheet (default: $SHEET_EVENTS_CSV_URL)");
    eprintln!("      --wallets-url URL     Wallet sheet (default: $SHEET_WALLETS_CSV_URL)");
    eprintln!("      --settlements-dir DIR Settlement records (default: admin/settlements)");
    eprintln!("  -o, --out-dir DIR         Ledger output root (default: payouts)");
    eprintln!("  -v, --verbose             Verbose logging");
}

fn main() {
    let args = match CliArgs::parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match PayoutConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if args.events_url.is_some() {
        config.events_csv_url = args.events_url.clone();
    }
    if args.wallets_url.is_some() {
        config.wallets_csv_url = args.wallets_url.clone();
    }
    if let Some(dir) = &args.settlements_dir {
        config.settlements_dir = dir.clone();
    }
    if let Some(dir) = &args.out_dir {
        config.payouts_dir = dir.clone();
    }

    let Some(events_url) = config.events_csv_url.clone() else {
        eprintln!("Error: missing SHEET_EVENTS_CSV_URL (or --events-url)");
        std::process::exit(1);
    };

    let period = match &args.period {
        Some(tag) => SettlementPeriod::from_tag(tag),
        None => SettlementPeriod::previous_month(Utc::now()),
    };
    let Some(period) = period else {
        eprintln!("Error: invalid --period (expected YYYY-MM)");
        std::process::exit(1);
    };
    let tag = period.tag();
    info!(%tag, "computing payouts");

    let settlement =
        match feeds::read_settlement(std::path::Path::new(&config.settlements_dir), &tag) {
            Ok(Some(s)) => s,
            Ok(None) => {
                eprintln!(
                    "Error: missing {}/{}.json with {{ \"received_revenue_usd\": number }}",
                    config.settlements_dir, tag
                );
                std::process::exit(2);
            }
            Err(e) => {
                error!(error = %e, "settlement record unreadable");
                std::process::exit(3);
            }
        };

    let events_text = match feeds::fetch_text(&events_url) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "events sheet fetch failed");
            std::process::exit(3);
        }
    };
    let events = feeds::parse_event_rows(&feeds::parse_csv(&events_text));
    let wallets = feeds::load_wallet_directory(config.wallets_csv_url.as_deref());

    let pipeline_config = config.pipeline();
    let ledger = pipeline::run(
        &period,
        &events,
        settlement.received_revenue_usd,
        &wallets,
        &pipeline_config,
    );

    if ledger.meta.zero_payout_phase {
        info!(
            theoretical_pool_usd = ledger.meta.theoretical_pool_usd,
            "bootstrap phase: units tracked, payout pool forced to $0"
        );
    }

    let violations = check_ledger(&ledger, pipeline_config.wallet_cap_pct);
    if !violations.is_empty() {
        for v in &violations {
            error!(check = v.check, detail = %v.detail, "ledger invariant violated");
        }
        std::process::exit(3);
    }

    match report::write_ledger(std::path::Path::new(&config.payouts_dir), &ledger) {
        Ok(dir) => {
            println!(
                "Ledger for {} written to {} with {} rows. Pool ${:.2}.",
                tag,
                dir.display(),
                ledger.rows.len(),
                ledger.pool_usd
            );
        }
        Err(e) => {
            error!(error = %e, "ledger write failed");
            std::process::exit(3);
        }
    }
}

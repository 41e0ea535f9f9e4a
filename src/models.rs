//! Runtime Configuration
//!
//! Environment-driven settings for the payout batch job, resolved once at
//! startup. CLI flags in the binary override individual fields.

use crate::payout::pipeline::PipelineConfig;

/// Batch job configuration.
#[derive(Debug, Clone)]
pub struct PayoutConfig {
    /// Exported events sheet. Required for a run.
    pub events_csv_url: Option<String>,
    /// Exported wallet registration sheet. Optional; without it every
    /// recipient resolves to `NO_WALLET`.
    pub wallets_csv_url: Option<String>,
    /// Per-wallet cap as a fraction of the pool.
    pub wallet_cap_pct: f64,
    /// Operator adm code receiving redirects and overflow.
    pub creator_adm_code: Option<String>,
    /// Directory holding `<tag>.json` settlement records.
    pub settlements_dir: String,
    /// Root directory for written ledgers.
    pub payouts_dir: String,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl PayoutConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let wallet_cap_pct = std::env::var("WALLET_CAP_PCT")
            .unwrap_or_else(|_| "0.01".to_string())
            .parse()
            .unwrap_or(0.01);

        let settlements_dir = std::env::var("SETTLEMENTS_DIR")
            .unwrap_or_else(|_| "admin/settlements".to_string());

        let payouts_dir = std::env::var("PAYOUTS_DIR").unwrap_or_else(|_| "payouts".to_string());

        Ok(Self {
            events_csv_url: env_nonempty("SHEET_EVENTS_CSV_URL"),
            wallets_csv_url: env_nonempty("SHEET_WALLETS_CSV_URL"),
            wallet_cap_pct,
            creator_adm_code: env_nonempty("CREATOR_ADM_CODE"),
            settlements_dir,
            payouts_dir,
        })
    }

    /// The pure-computation config derived from these settings.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            pool: Default::default(),
            wallet_cap_pct: self.wallet_cap_pct,
            creator_recipient: self.creator_adm_code.clone(),
        }
    }
}

//! Payout Address Resolution
//!
//! Maps adm codes to payout wallets via the registration feed. A wallet key
//! is the opaque string `"chain:address"`. Recipients without a registered
//! wallet resolve to the [`NO_WALLET`] sentinel, which is a groupable key
//! during aggregation and is excluded from the waterfall.

use std::collections::HashMap;

/// Sentinel address for recipients with no registered payout destination.
pub const NO_WALLET: &str = "NO_WALLET";

/// adm code -> wallet key directory built from the registration feed.
#[derive(Debug, Clone, Default)]
pub struct WalletDirectory {
    by_adm: HashMap<String, String>,
}

impl WalletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one registration. Later entries for the same adm code replace
    /// earlier ones (last write wins, matching feed order). Entries with an
    /// empty field are ignored.
    pub fn register(&mut self, adm_code: &str, chain: &str, address: &str) {
        let adm = adm_code.trim().to_uppercase();
        let chain = chain.trim().to_lowercase();
        let address = address.trim().to_lowercase();
        if adm.is_empty() || chain.is_empty() || address.is_empty() {
            return;
        }
        self.by_adm.insert(adm, format!("{}:{}", chain, address));
    }

    /// Resolve an adm code to its wallet key, or [`NO_WALLET`].
    pub fn resolve(&self, adm_code: &str) -> &str {
        self.by_adm
            .get(&adm_code.trim().to_uppercase())
            .map(String::as_str)
            .unwrap_or(NO_WALLET)
    }

    pub fn len(&self) -> usize {
        self.by_adm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_adm.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

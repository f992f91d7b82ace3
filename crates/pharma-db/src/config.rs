//! # Engine Configuration
//!
//! Settings loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`PHARMA_*`)
//! 2. Defaults (this file)
//!
//! Read-only after initialization.

use std::path::PathBuf;

use pharma_core::SummaryRates;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Store name (displayed on receipts)
    pub store_name: String,

    /// SQLite file used by binaries that don't take a path argument
    pub database_path: PathBuf,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Default tax rate, percent (e.g. 7.5)
    pub default_tax_rate_percent: f64,

    /// Default discount rate, percent
    pub default_discount_rate_percent: f64,

    /// Quantity at or below which a drug counts as low stock
    pub low_stock_threshold: i64,

    /// Days ahead to warn about expiring drugs
    pub expiry_warning_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            store_name: "Community Pharmacy".to_string(),
            database_path: PathBuf::from("./pharmacy.db"),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_tax_rate_percent: 0.0,
            default_discount_rate_percent: 0.0,
            low_stock_threshold: 10,
            expiry_warning_days: 30,
        }
    }
}

impl EngineConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `PHARMA_STORE_NAME`
    /// - `PHARMA_DB_PATH`
    /// - `PHARMA_CURRENCY_SYMBOL`
    /// - `PHARMA_TAX_RATE`: percent, e.g. "7.5"
    /// - `PHARMA_DISCOUNT_RATE`: percent
    /// - `PHARMA_LOW_STOCK_THRESHOLD`
    /// - `PHARMA_EXPIRY_WARNING_DAYS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    /// Unparseable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = EngineConfig::default();

        if let Some(store_name) = lookup("PHARMA_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(path) = lookup("PHARMA_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(symbol) = lookup("PHARMA_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(rate) = parse(&lookup, "PHARMA_TAX_RATE") {
            config.default_tax_rate_percent = rate;
        }

        if let Some(rate) = parse(&lookup, "PHARMA_DISCOUNT_RATE") {
            config.default_discount_rate_percent = rate;
        }

        if let Some(threshold) = parse(&lookup, "PHARMA_LOW_STOCK_THRESHOLD") {
            config.low_stock_threshold = threshold;
        }

        if let Some(days) = parse(&lookup, "PHARMA_EXPIRY_WARNING_DAYS") {
            config.expiry_warning_days = days;
        }

        config
    }

    /// Default rates for the running sale summary.
    pub fn summary_rates(&self) -> SummaryRates {
        SummaryRates::new(
            self.default_tax_rate_percent,
            self.default_discount_rate_percent,
        )
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use pharma_db::EngineConfig;
    ///
    /// let config = EngineConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}

//! Configuration loaded from environment variables.
//!
//! Every setting comes from the environment (or a `.env` file via `dotenvy`)
//! and falls back to a default when missing or unparsable.

use std::path::PathBuf;

use crate::Amount;
use crate::persist::STORAGE_NAME;
use crate::store::{
    DEFAULT_DISCOUNT_PERCENT, DEFAULT_MAX_GUESTS, DEFAULT_NIGHTLY_RATE, MAX_NIGHTLY_RATE,
    StoreSettings,
};

/// Default admin password of the booking site.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON storage file (`REZ_STORAGE_PATH`).
    pub storage_path: PathBuf,

    /// Nightly rate in lira when no dynamic price applies (`REZ_DEFAULT_NIGHTLY_RATE`).
    pub default_nightly_rate: i64,

    /// Discount for discounted quotes, in percent (`REZ_DISCOUNT_PERCENT`).
    pub discount_percent: u8,

    /// Maximum guests per reservation (`REZ_MAX_GUESTS`).
    pub max_guests: u8,

    /// Password of the admin commands (`REZ_ADMIN_PASSWORD`).
    pub admin_password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(format!("{STORAGE_NAME}.json")),
            default_nightly_rate: DEFAULT_NIGHTLY_RATE,
            discount_percent: DEFAULT_DISCOUNT_PERCENT,
            max_guests: DEFAULT_MAX_GUESTS,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            storage_path: std::env::var("REZ_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            default_nightly_rate: nightly_rate_or(
                parse_env("REZ_DEFAULT_NIGHTLY_RATE", defaults.default_nightly_rate),
                defaults.default_nightly_rate,
            ),
            discount_percent: parse_env("REZ_DISCOUNT_PERCENT", defaults.discount_percent).min(100),
            max_guests: parse_env("REZ_MAX_GUESTS", defaults.max_guests).max(1),
            admin_password: std::env::var("REZ_ADMIN_PASSWORD")
                .unwrap_or(defaults.admin_password),
        }
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            default_rate: Amount::from_lira(self.default_nightly_rate),
            discount_percent: self.discount_percent,
            max_guests: self.max_guests,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Keeps `rate` when it lies in `1..=MAX_NIGHTLY_RATE`, otherwise returns `default`.
fn nightly_rate_or(rate: i64, default: i64) -> i64 {
    if (1..=MAX_NIGHTLY_RATE).contains(&rate) {
        rate
    } else {
        default
    }
}

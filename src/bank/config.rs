//! Ledger configuration.
//!
//! Defaults can be overridden through environment variables:
//! `LEDGER_SNAPSHOT`, `LEDGER_PRIORITY_THRESHOLD`, `LEDGER_BUCKETS` and
//! `LEDGER_REFRESH_INDEX`.
use std::path::PathBuf;

use crate::bank::{ConfigError, Money, parse_money};

/// Default location of the snapshot file.
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/bank_data.json";

/// Transfers strictly above this amount are processed before ordinary transfers.
pub const DEFAULT_PRIORITY_THRESHOLD: Money = 1_000_000 * 10_000;

/// Default number of buckets in each keyed store.
pub const DEFAULT_BUCKET_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Where the snapshot lives. `None` keeps the ledger purely in memory.
    pub snapshot_path: Option<PathBuf>,

    /// Transfers strictly above this amount go to the priority heap.
    pub priority_threshold: Money,

    /// Number of buckets in the customer and account stores.
    pub bucket_count: usize,

    /// Rebuild the balance index before a range query if any balance changed since the
    /// last build.
    pub refresh_balance_index: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            snapshot_path: Some(PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            priority_threshold: DEFAULT_PRIORITY_THRESHOLD,
            bucket_count: DEFAULT_BUCKET_COUNT,
            refresh_balance_index: true,
        }
    }
}

impl LedgerConfig {
    /// A configuration without a snapshot file.
    pub fn in_memory() -> Self {
        LedgerConfig {
            snapshot_path: None,
            ..Default::default()
        }
    }

    /// Loads the default configuration, applying overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the default configuration, applying overrides returned by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LedgerConfig::default();

        if let Some(path) = lookup("LEDGER_SNAPSHOT") {
            config.snapshot_path = match path.trim() {
                "" | "none" | "memory" => None,
                path => Some(PathBuf::from(path)),
            };
        }

        if let Some(value) = lookup("LEDGER_PRIORITY_THRESHOLD") {
            config.priority_threshold = parse_money(&value).ok_or(ConfigError::InvalidValue {
                key: "LEDGER_PRIORITY_THRESHOLD",
                value,
            })?;
        }

        if let Some(value) = lookup("LEDGER_BUCKETS") {
            let buckets: usize = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "LEDGER_BUCKETS",
                value: value.clone(),
            })?;
            config.bucket_count = buckets.max(1);
        }

        if let Some(value) = lookup("LEDGER_REFRESH_INDEX") {
            let refresh = match value.trim() {
                "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
                "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
                _ => None,
            };
            config.refresh_balance_index = refresh.ok_or(ConfigError::InvalidValue {
                key: "LEDGER_REFRESH_INDEX",
                value,
            })?;
        }

        Ok(config)
    }
}

//! Configuration module
//!
//! Engine configuration is read from `REFSTORE_*` environment variables with
//! validated defaults, so a bare deployment starts with sensible behavior.

use std::env;

const DELAYED_PAGE_SIZE: i64 = 500;
const GROUP_EVENT_MAX_RESULTS: usize = 500;
const REFERENCE_EXPIRATION_DAYS: i64 = 5;
const SWEEP_INTERVAL_SECS: u64 = 30;
const GROUP_CHECK_INTERVAL_SECS: u64 = 60;

/// Tunables recognized by the request engine and its sweeps.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Page size for one delayed-request promotion sweep.
    pub delayed_page_size: i64,
    /// Maximum result entries per outbound group event; larger groups are
    /// split across multiple events.
    pub group_event_max_results: usize,
    /// Expiration offset in days for request groups. Zero or negative
    /// disables expiration.
    pub reference_expiration_days: i64,
    /// Interval between delayed-request promotion sweeps.
    pub sweep_interval_secs: u64,
    /// Interval between group-completion reconciliation runs.
    pub group_check_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delayed_page_size: DELAYED_PAGE_SIZE,
            group_event_max_results: GROUP_EVENT_MAX_RESULTS,
            reference_expiration_days: REFERENCE_EXPIRATION_DAYS,
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            group_check_interval_secs: GROUP_CHECK_INTERVAL_SECS,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            delayed_page_size: env_parse("REFSTORE_DELAYED_PAGE_SIZE", DELAYED_PAGE_SIZE)?,
            group_event_max_results: env_parse(
                "REFSTORE_GROUP_EVENT_MAX_RESULTS",
                GROUP_EVENT_MAX_RESULTS,
            )?,
            reference_expiration_days: env_parse(
                "REFSTORE_REFERENCE_EXPIRATION_DAYS",
                REFERENCE_EXPIRATION_DAYS,
            )?,
            sweep_interval_secs: env_parse("REFSTORE_SWEEP_INTERVAL_SECS", SWEEP_INTERVAL_SECS)?,
            group_check_interval_secs: env_parse(
                "REFSTORE_GROUP_CHECK_INTERVAL_SECS",
                GROUP_CHECK_INTERVAL_SECS,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.delayed_page_size <= 0 {
            anyhow::bail!("REFSTORE_DELAYED_PAGE_SIZE must be positive");
        }
        if self.group_event_max_results == 0 {
            anyhow::bail!("REFSTORE_GROUP_EVENT_MAX_RESULTS must be positive");
        }
        Ok(())
    }

    /// Expiration is disabled when the configured offset is not positive.
    pub fn expiration_enabled(&self) -> bool {
        self.reference_expiration_days > 0
    }
}

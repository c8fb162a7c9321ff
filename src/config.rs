//! Ledger configuration loaded from environment variables.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings for a ledger host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Clock seconds per campaign duration unit (durations are entered in days)
    pub duration_unit_secs: u64,
    /// Oldest signed command accepted, in seconds of ledger time
    pub command_max_age_secs: u64,
    /// How far ahead of ledger time a command timestamp may be
    pub command_future_tolerance_secs: u64,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            duration_unit_secs: 86_400,
            command_max_age_secs: 300,
            command_future_tolerance_secs: 30,
            log_filter: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Read `TIERFUND_*` variables, falling back to defaults for unset ones
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            duration_unit_secs: parse_u64(
                &lookup,
                "TIERFUND_DURATION_UNIT_SECS",
                defaults.duration_unit_secs,
            )?,
            command_max_age_secs: parse_u64(
                &lookup,
                "TIERFUND_COMMAND_MAX_AGE_SECS",
                defaults.command_max_age_secs,
            )?,
            command_future_tolerance_secs: parse_u64(
                &lookup,
                "TIERFUND_COMMAND_FUTURE_TOLERANCE_SECS",
                defaults.command_future_tolerance_secs,
            )?,
            log_filter: lookup("TIERFUND_LOG").unwrap_or(defaults.log_filter),
        })
    }

    pub fn with_duration_unit_secs(mut self, secs: u64) -> Self {
        self.duration_unit_secs = secs;
        self
    }

    pub fn with_command_max_age_secs(mut self, secs: u64) -> Self {
        self.command_max_age_secs = secs;
        self
    }

    pub fn with_command_future_tolerance_secs(mut self, secs: u64) -> Self {
        self.command_future_tolerance_secs = secs;
        self
    }

    /// Convert a duration in units to clock seconds
    pub fn duration_secs(&self, units: u64) -> Option<u64> {
        units.checked_mul(self.duration_unit_secs)
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The auction engine operates against a pair of timing parameters.
/// This config describes them; implementations persist it alongside the
/// records so a store cannot be reopened under different rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConfig", into = "RawConfig")]
pub struct Config {
    /// How close to its end time a live auction is announced as ending soon.
    pub ending_soon_within: Duration,
    /// How long to wait on the payment provider before recording a settlement as failed.
    pub settlement_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ending_soon_within: Duration::from_secs(300),
            settlement_timeout: Duration::from_secs(30),
        }
    }
}

// Serde round-trips through this primitive-only mirror of the struct:
// durations become plain seconds on the wire and in the config table.
// The u32 (rather than u64) is because JSON cannot carry full 64 bit
// integers.

#[derive(Serialize, Deserialize)]
pub struct RawConfig {
    pub ending_soon_within: u32,
    pub settlement_timeout: u32,
}

impl From<RawConfig> for Config {
    fn from(value: RawConfig) -> Self {
        Self {
            ending_soon_within: Duration::from_secs(value.ending_soon_within as u64),
            settlement_timeout: Duration::from_secs(value.settlement_timeout as u64),
        }
    }
}

impl From<Config> for RawConfig {
    fn from(value: Config) -> Self {
        Self {
            ending_soon_within: value.ending_soon_within.as_secs() as u32,
            settlement_timeout: value.settlement_timeout.as_secs() as u32,
        }
    }
}

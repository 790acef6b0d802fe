use crate::domain::Preset;
use crate::execution::{Backoff, CompensationPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/* =======================
POLL BACKOFF
======================= */

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PollBackoffConfig {
    #[default]
    Fixed,
    Exponential { max_interval_ms: u64 },
}

impl PollBackoffConfig {
    pub fn to_backoff(self) -> Backoff {
        match self {
            PollBackoffConfig::Fixed => Backoff::Fixed,
            PollBackoffConfig::Exponential { max_interval_ms } => Backoff::Exponential {
                max_interval: Duration::from_millis(max_interval_ms),
            },
        }
    }
}

/* =======================
RATE LIMIT
======================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests: u32,
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // one call every two seconds against the relay
        Self {
            requests: 1,
            window_ms: 2_000,
        }
    }
}

/* =======================
ALLOWANCES
======================= */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceConfig {
    pub reset_to_zero_first: bool,

    /// Token address -> reset-to-zero override.
    #[serde(default)]
    pub per_token: HashMap<String, bool>,
}

impl Default for AllowanceConfig {
    fn default() -> Self {
        Self {
            reset_to_zero_first: true,
            per_token: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowanceSourceKind {
    /// ERC-20 `allowance` / `approve` through the RPC node.
    #[default]
    Chain,
    /// 1inch approve API.
    Api,
}

/* =======================
SWAP CONFIG
======================= */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    pub from_token: String,
    pub to_token: String,

    /// Human-readable amount of `from_token`, scaled by `decimals`.
    pub amount: String,
    pub decimals: u32,

    pub preset: Preset,

    pub poll_interval_ms: u64,
    #[serde(default)]
    pub max_poll_wait_secs: Option<u64>,
    #[serde(default)]
    pub poll_backoff: PollBackoffConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub allowance: AllowanceConfig,
    #[serde(default)]
    pub allowance_source: AllowanceSourceKind,
    #[serde(default)]
    pub compensation: CompensationPolicy,
}

use crate::client::approve::DEFAULT_APPROVE_URL;
use crate::client::{Quota, DEFAULT_FUSION_URL};
use crate::domain::Preset;
use crate::execution::order_builder::AGGREGATION_ROUTER_V6;
use crate::execution::{PollPolicy, SwapSettings};
use crate::wallet::ResetPolicy;
use clap::Parser;
use ethers::types::{Address, U256};
use ethers::utils::parse_units;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub mod swap;

pub use swap::{
    AllowanceConfig, AllowanceSourceKind, PollBackoffConfig, RateLimitConfig, SwapConfig,
};

/// BSC mainnet.
pub const BSC_CHAIN_ID: u64 = 56;
pub const WBNB: &str = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c";
pub const BSC_USDC: &str = "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d";

/* =======================
ERRORS
======================= */

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} is not set (config file or environment)")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/* =======================
CLI ARGS
======================= */

#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Asset to sell (token address, or 0x0/0xeeee… for native)
    #[arg(long)]
    pub from: Option<String>,

    /// Asset to buy (token address, or 0x0/0xeeee… for native)
    #[arg(long)]
    pub to: Option<String>,

    /// Human-readable amount to sell
    #[arg(long)]
    pub amount: Option<String>,
}

/* =======================
MAIN CONFIG
======================= */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub fusion: FusionConfig,
    pub chain: ChainConfig,
    pub swap: SwapConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub api_url: String,
    pub approve_api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    pub wrapped_native: String,
    pub settlement_contract: String,
    pub confirmations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub private_key: Option<String>,
}

/* =======================
DEFAULT CONFIG
======================= */

impl Default for Config {
    fn default() -> Self {
        Self {
            fusion: FusionConfig {
                api_url: DEFAULT_FUSION_URL.to_string(),
                approve_api_url: DEFAULT_APPROVE_URL.to_string(),
                api_key: None,
            },
            chain: ChainConfig {
                chain_id: BSC_CHAIN_ID,
                rpc_url: None,
                wrapped_native: WBNB.to_string(),
                settlement_contract: AGGREGATION_ROUTER_V6.to_string(),
                confirmations: 1,
            },
            // 0.005 BNB -> USDC
            swap: SwapConfig {
                from_token: crate::domain::NATIVE_SENTINEL.to_string(),
                to_token: BSC_USDC.to_string(),
                amount: "0.005".to_string(),
                decimals: 18,
                preset: Preset::Fast,
                poll_interval_ms: 10_000,
                max_poll_wait_secs: None,
                poll_backoff: PollBackoffConfig::Fixed,
                rate_limit: RateLimitConfig::default(),
                allowance: AllowanceConfig::default(),
                allowance_source: AllowanceSourceKind::Chain,
                compensation: Default::default(),
            },
            wallet: WalletConfig { private_key: None },
        }
    }
}

/* =======================
RESOLVED CONFIG
======================= */

/// Validated settings, ready to wire a swap.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub fusion_url: Url,
    pub approve_url: Url,
    pub api_key: String,
    pub chain_id: u64,
    pub rpc_url: Url,
    pub private_key: String,
    pub settlement: Address,
    pub confirmations: usize,
    pub from_token: String,
    pub to_token: String,
    pub amount: U256,
    pub allowance_source: AllowanceSourceKind,
    pub rate_limit: Quota,
    pub settings: SwapSettings,
}

/* =======================
LOAD / OVERLAY / RESOLVE
======================= */

impl Config {
    /// Read the config file, or write the defaults there if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            let cfg = Config::default();
            let content = serde_json::to_string_pretty(&cfg)?;
            std::fs::write(path, content)?;
            Ok(cfg)
        }
    }

    /// Secrets and the RPC endpoint come from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = set("PRIVATE_KEY") {
            self.wallet.private_key = Some(key);
        }
        if let Some(url) = set("RPC_URL") {
            self.chain.rpc_url = Some(url);
        }
        if let Some(key) = set("ONE_INCH_API_KEY") {
            self.fusion.api_key = Some(key);
        }
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(from) = &args.from {
            self.swap.from_token = from.clone();
        }
        if let Some(to) = &args.to {
            self.swap.to_token = to.clone();
        }
        if let Some(amount) = &args.amount {
            self.swap.amount = amount.clone();
        }
    }

    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let api_key = required(&self.fusion.api_key, "ONE_INCH_API_KEY")?;
        let private_key = required(&self.wallet.private_key, "PRIVATE_KEY")?;
        let rpc_url = required(&self.chain.rpc_url, "RPC_URL")?;

        let fusion_url =
            Url::parse(&self.fusion.api_url).map_err(|e| invalid("fusion.api_url", e))?;
        let approve_url = Url::parse(&self.fusion.approve_api_url)
            .map_err(|e| invalid("fusion.approve_api_url", e))?;
        let rpc_url = Url::parse(&rpc_url).map_err(|e| invalid("chain.rpc_url", e))?;

        let wrapped_native = parse_address(&self.chain.wrapped_native, "chain.wrapped_native")?;
        let settlement =
            parse_address(&self.chain.settlement_contract, "chain.settlement_contract")?;

        let amount: U256 = parse_units(self.swap.amount.trim(), self.swap.decimals)
            .map_err(|e| invalid("swap.amount", e))?
            .into();
        if amount.is_zero() {
            return Err(invalid("swap.amount", "must be greater than zero"));
        }

        let swap = &self.swap;
        if swap.poll_interval_ms == 0 {
            return Err(invalid("swap.poll_interval_ms", "must be greater than zero"));
        }
        if let PollBackoffConfig::Exponential { max_interval_ms } = swap.poll_backoff {
            if max_interval_ms < swap.poll_interval_ms {
                return Err(invalid(
                    "swap.poll_backoff.max_interval_ms",
                    "must be at least poll_interval_ms",
                ));
            }
        }
        if swap.rate_limit.requests == 0 {
            return Err(invalid("swap.rate_limit.requests", "must be greater than zero"));
        }

        let mut overrides = HashMap::new();
        for (token, reset) in &swap.allowance.per_token {
            overrides.insert(parse_address(token, "swap.allowance.per_token")?, *reset);
        }

        let settings = SwapSettings {
            wrapped_native,
            preset: swap.preset,
            poll: PollPolicy {
                interval: Duration::from_millis(swap.poll_interval_ms),
                backoff: swap.poll_backoff.to_backoff(),
                max_wait: swap.max_poll_wait_secs.map(Duration::from_secs),
            },
            reset: ResetPolicy {
                reset_by_default: swap.allowance.reset_to_zero_first,
                overrides,
            },
            compensation: swap.compensation,
        };

        Ok(ResolvedConfig {
            fusion_url,
            approve_url,
            api_key,
            chain_id: self.chain.chain_id,
            rpc_url,
            private_key,
            settlement,
            confirmations: self.chain.confirmations,
            from_token: swap.from_token.clone(),
            to_token: swap.to_token.clone(),
            amount,
            allowance_source: swap.allowance_source,
            rate_limit: Quota::new(
                swap.rate_limit.requests,
                Duration::from_millis(swap.rate_limit.window_ms),
            ),
            settings,
        })
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(name))
}

fn parse_address(raw: &str, field: &'static str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| invalid(field, format!("'{}': {}", raw, e)))
}

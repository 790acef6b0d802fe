use fusion_swap::*;

use anyhow::{Context, Result};
use clap::Parser;
use config::{AllowanceSourceKind, Args, Config};
use ethers::utils::format_ether;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use chain::{ChainClient, EthersChainClient};
use client::{ApproveApiClient, FusionClient, RateLimiter};
use domain::{SwapOutcome, SwapRequest};
use execution::order_builder::FusionOrderBuilder;
use execution::{SwapContext, Swapper};
use wallet::{AllowanceSource, OnChainAllowance, OrderSigner, WalletSigner};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    info!("🚀 Starting 1inch Fusion swap");

    let args = Args::parse();
    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.apply_env();
    config.apply_args(&args);
    let resolved = config.resolve()?;

    // ===============================
    // WALLET / CHAIN
    // ===============================
    let signer = WalletSigner::new(&resolved.private_key, resolved.chain_id)?;
    info!("🔑 Signer loaded: {:?}", signer.address());

    let chain: Arc<dyn ChainClient> = Arc::new(
        EthersChainClient::connect(
            resolved.rpc_url.as_str(),
            signer.wallet(),
            resolved.chain_id,
            resolved.confirmations,
        )
        .await?,
    );

    let balance = chain
        .native_balance(signer.address())
        .await
        .context("reading native balance")?;
    info!("💰 Native balance: {}", format_ether(balance));

    // ===============================
    // API CLIENTS
    // ===============================
    let limiter = Arc::new(RateLimiter::new(resolved.rate_limit));

    let relay = Arc::new(FusionClient::new(
        resolved.fusion_url.as_str(),
        &resolved.api_key,
        resolved.chain_id,
        limiter.clone(),
    )?);

    let allowance_source: Arc<dyn AllowanceSource> = match resolved.allowance_source {
        AllowanceSourceKind::Chain => {
            Arc::new(OnChainAllowance::new(chain.clone(), resolved.settlement))
        }
        AllowanceSourceKind::Api => Arc::new(ApproveApiClient::new(
            resolved.approve_url.as_str(),
            &resolved.api_key,
            resolved.chain_id,
            resolved.settlement,
            limiter.clone(),
        )?),
    };

    let orders = Arc::new(
        FusionOrderBuilder::new(resolved.chain_id, resolved.settlement)
            .with_fallback_settlement(resolved.settlement),
    );

    // ===============================
    // SHUTDOWN
    // ===============================
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 Ctrl-C received, stopping after the current step");
                cancel.cancel();
            }
        }
    });

    let request = SwapRequest::new(
        resolved.from_token.clone(),
        resolved.to_token.clone(),
        resolved.amount,
        signer.address(),
    );

    let swapper = Swapper::new(SwapContext {
        chain,
        relay,
        signer: Arc::new(signer),
        orders,
        allowance_source,
        settings: resolved.settings.clone(),
        cancel,
    });

    // ===============================
    // RUN
    // ===============================
    match swapper.execute(&request).await? {
        SwapOutcome::Filled {
            order_uid,
            unwrapped,
        } => {
            info!("🎉 Swap complete, order {} filled", order_uid);
            if let Some(amount) = unwrapped {
                info!("💰 Received {} native", format_ether(amount));
            }
        }
        SwapOutcome::Cancelled { order_uid } => {
            warn!("🚫 Order {} was cancelled; nothing was swapped", order_uid);
        }
        SwapOutcome::TimedOut {
            order_uid,
            last_status,
        } => {
            warn!(
                "⌛ Stopped waiting for order {} (last status: {}); it may still fill",
                order_uid,
                last_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            );
        }
    }

    Ok(())
}

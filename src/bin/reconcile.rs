use anyhow::Result;
use clap::Parser;
use ethers::utils::format_ether;
use fusion_swap::chain::{ChainClient, EthersChainClient};
use fusion_swap::config::Config;
use fusion_swap::wallet::{WalletSigner, WrapManager};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Unwrap whatever wrapped-native balance the wallet holds.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Only report the balance
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    config.apply_env();
    let resolved = config.resolve()?;

    let signer = WalletSigner::new(&resolved.private_key, resolved.chain_id)?;
    let chain: Arc<dyn ChainClient> = Arc::new(
        EthersChainClient::connect(
            resolved.rpc_url.as_str(),
            signer.wallet(),
            resolved.chain_id,
            resolved.confirmations,
        )
        .await?,
    );

    let wraps = WrapManager::new(chain, resolved.settings.wrapped_native);
    let balance = wraps.wrapped_balance().await?;
    info!(
        "🧾 Wrapped balance of {:?}: {}",
        wraps.wrapped_native(),
        format_ether(balance)
    );

    if args.dry_run {
        return Ok(());
    }

    match wraps.unwrap(None).await? {
        Some(amount) => info!("✅ Reconciled, {} unwrapped", format_ether(amount)),
        None => info!("✅ Nothing to reconcile"),
    }

    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::Parser;
use fusion_swap::client::{FusionClient, RateLimiter, RelayApi};
use fusion_swap::config::Config;
use fusion_swap::domain::OrderUid;
use std::path::PathBuf;
use std::sync::Arc;

/// Print the relay status of a Fusion order.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Order hash (0x + 64 hex digits)
    order: String,

    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let Some(uid) = OrderUid::parse(&args.order) else {
        bail!("'{}' is not an order hash", args.order);
    };

    let mut config = Config::load(&args.config)?;
    config.apply_env();
    let api_key = config
        .fusion
        .api_key
        .clone()
        .context("ONE_INCH_API_KEY missing in .env file")?;

    let relay = FusionClient::new(
        &config.fusion.api_url,
        &api_key,
        config.chain.chain_id,
        Arc::new(RateLimiter::unlimited()),
    )?;

    let status = relay.get_order_status(&uid).await?;

    println!("\n=== ORDER {} ===", uid);
    println!("Status: {}", status.status);
    if status.fills.is_empty() {
        println!("Fills:  none");
    }
    for fill in &status.fills {
        println!(
            "Fill:   tx {} maker {} taker {}",
            fill.tx_hash.as_deref().unwrap_or("-"),
            fill.filled_maker_amount.unwrap_or_default(),
            fill.filled_auction_taker_amount.unwrap_or_default()
        );
    }

    Ok(())
}

use crate::chain::TxReceipt;
use crate::domain::{OrderStatus, SwapStage};
use crate::execution::errors::TxStep;
use log::{error, info, warn};

pub fn log_stage(stage: SwapStage) {
    info!("➡️  {}", stage);
}

pub fn log_tx(step: TxStep, receipt: &TxReceipt) {
    info!(
        "⛓️  {} confirmed — tx {:?} block {}",
        step,
        receipt.tx_hash,
        receipt
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string())
    );
}

pub fn log_poll(attempt: u32, status: &OrderStatus) {
    info!("🔎 Poll {} — order status: {}", attempt, status);
}

pub fn log_poll_error(attempt: u32, reason: &str) {
    warn!("🔁 Poll {} — status fetch failed: {}", attempt, reason);
}

pub fn log_rejection(reason: &str) {
    error!("❌ Rejected: {}", reason);
}

pub fn log_success(msg: &str) {
    info!("✅ {}", msg);
}

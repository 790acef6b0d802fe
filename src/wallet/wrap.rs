use crate::chain::contracts::{deposit_tx, read_balance, withdraw_tx};
use crate::chain::{ChainClient, TxReceipt};
use crate::execution::errors::{SwapError, TxStep};
use ethers::types::{Address, U256};
use ethers::utils::format_ether;
use log::info;
use std::sync::Arc;

/// Moves value between native currency and its wrapped token.
pub struct WrapManager {
    chain: Arc<dyn ChainClient>,
    wrapped_native: Address,
}

impl WrapManager {
    pub fn new(chain: Arc<dyn ChainClient>, wrapped_native: Address) -> Self {
        Self {
            chain,
            wrapped_native,
        }
    }

    pub fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    pub async fn wrapped_balance(&self) -> Result<U256, SwapError> {
        read_balance(self.chain.as_ref(), self.wrapped_native, self.chain.address())
            .await
            .map_err(|source| SwapError::ChainRead {
                what: "wrapped balance",
                source,
            })
    }

    pub async fn wrap(&self, amount: U256) -> Result<TxReceipt, SwapError> {
        let receipt = self
            .chain
            .send_transaction(deposit_tx(self.wrapped_native, amount))
            .await
            .map_err(|source| SwapError::Transaction {
                step: TxStep::Wrap,
                source,
            })?;

        crate::logging::log_tx(TxStep::Wrap, &receipt);
        info!("🎁 Wrapped {} native into {:?}", format_ether(amount), self.wrapped_native);
        Ok(receipt)
    }

    /// Withdraw `amount`, or the whole wrapped balance when `None`.
    /// Returns the amount unwrapped; an empty balance is not an error.
    pub async fn unwrap(&self, amount: Option<U256>) -> Result<Option<U256>, SwapError> {
        let amount = match amount {
            Some(amount) => amount,
            None => self.wrapped_balance().await?,
        };

        if amount.is_zero() {
            info!("ℹ️  No wrapped balance to unwrap");
            return Ok(None);
        }

        let receipt = self
            .chain
            .send_transaction(withdraw_tx(self.wrapped_native, amount))
            .await
            .map_err(|source| SwapError::Transaction {
                step: TxStep::Unwrap,
                source,
            })?;

        crate::logging::log_tx(TxStep::Unwrap, &receipt);
        info!("🔓 Unwrapped {} back into native", format_ether(amount));
        Ok(Some(amount))
    }
}

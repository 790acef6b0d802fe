use crate::chain::contracts::{approve_tx, read_allowance};
use crate::chain::{ChainClient, TxReceipt, TxRequest};
use crate::execution::errors::{SwapError, TxStep};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

// ===============================
// ALLOWANCE SOURCES
// ===============================

/// Where allowances are read from and approval calldata comes from.
#[async_trait]
pub trait AllowanceSource: Send + Sync {
    /// The contract being approved.
    fn spender(&self) -> Address;

    async fn allowance(&self, token: Address, owner: Address) -> Result<U256, SwapError>;

    async fn approval_transaction(&self, token: Address, amount: U256)
        -> Result<TxRequest, SwapError>;
}

/// Reads `allowance()` straight from the token and encodes `approve()` locally.
pub struct OnChainAllowance {
    chain: Arc<dyn ChainClient>,
    spender: Address,
}

impl OnChainAllowance {
    pub fn new(chain: Arc<dyn ChainClient>, spender: Address) -> Self {
        Self { chain, spender }
    }
}

#[async_trait]
impl AllowanceSource for OnChainAllowance {
    fn spender(&self) -> Address {
        self.spender
    }

    async fn allowance(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        read_allowance(self.chain.as_ref(), token, owner, self.spender)
            .await
            .map_err(|source| SwapError::ChainRead {
                what: "allowance",
                source,
            })
    }

    async fn approval_transaction(
        &self,
        token: Address,
        amount: U256,
    ) -> Result<TxRequest, SwapError> {
        Ok(approve_tx(token, self.spender, amount))
    }
}

// ===============================
// RESET POLICY
// ===============================

/// Whether a nonzero-but-short allowance must be zeroed before it is raised.
/// Some tokens (USDT-style) reject a direct change between two nonzero values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPolicy {
    pub reset_by_default: bool,
    pub overrides: HashMap<Address, bool>,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            reset_by_default: true,
            overrides: HashMap::new(),
        }
    }
}

impl ResetPolicy {
    pub fn requires_reset(&self, token: Address) -> bool {
        self.overrides
            .get(&token)
            .copied()
            .unwrap_or(self.reset_by_default)
    }
}

// ===============================
// MANAGER
// ===============================

pub struct AllowanceManager {
    chain: Arc<dyn ChainClient>,
    source: Arc<dyn AllowanceSource>,
    policy: ResetPolicy,
}

impl AllowanceManager {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        source: Arc<dyn AllowanceSource>,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            chain,
            source,
            policy,
        }
    }

    /// Make sure the spender may move at least `required` of `token`.
    /// Returns the approval transactions that were needed, in order.
    pub async fn ensure(
        &self,
        token: Address,
        required: U256,
    ) -> Result<Vec<TxReceipt>, SwapError> {
        let owner = self.chain.address();
        let current = self.source.allowance(token, owner).await?;

        if current >= required {
            info!("✅ Sufficient allowance already set for token {:?}", token);
            return Ok(Vec::new());
        }

        let mut receipts = Vec::with_capacity(2);

        if !current.is_zero() && self.policy.requires_reset(token) {
            warn!(
                "⚠️  Allowance {} is below required {}, resetting to zero first",
                current, required
            );
            receipts.push(self.approve(token, U256::zero(), TxStep::ApproveReset).await?);
        }

        receipts.push(self.approve(token, required, TxStep::Approve).await?);

        info!(
            "✅ Approved {} of {:?} for {:?}",
            required,
            token,
            self.source.spender()
        );
        Ok(receipts)
    }

    async fn approve(
        &self,
        token: Address,
        amount: U256,
        step: TxStep,
    ) -> Result<TxReceipt, SwapError> {
        let tx = self.source.approval_transaction(token, amount).await?;
        let receipt = self
            .chain
            .send_transaction(tx)
            .await
            .map_err(|source| SwapError::Transaction { step, source })?;

        crate::logging::log_tx(step, &receipt);
        Ok(receipt)
    }
}

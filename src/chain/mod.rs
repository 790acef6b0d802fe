use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use thiserror::Error;

pub mod contracts;
pub mod ethers_client;

pub use ethers_client::EthersChainClient;

// ==================================================
// ERRORS
// ==================================================

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction {0:?} reverted")]
    Reverted(H256),

    #[error("transaction {0:?} dropped before confirmation")]
    Dropped(H256),

    #[error("abi error: {0}")]
    Abi(String),
}

// ==================================================
// TRANSACTIONS
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl TxRequest {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::zero(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

// ==================================================
// CLIENT
// ==================================================

/// Everything the swap needs from the chain. `send_transaction` returns only
/// once the transaction is confirmed, so consecutive sends never race on the
/// wallet nonce.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The wallet that signs outgoing transactions.
    fn address(&self) -> Address;

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, ChainError>;

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;
}

use crate::chain::ChainError;
use crate::client::RelayError;
use crate::config::ConfigError;
use crate::domain::assets::RequestError;
use crate::domain::SwapStage;
use crate::wallet::signer::SigningError;
use std::fmt;
use thiserror::Error;

/// The on-chain steps of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStep {
    Wrap,
    ApproveReset,
    Approve,
    Unwrap,
}

impl fmt::Display for TxStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxStep::Wrap => "wrap",
            TxStep::ApproveReset => "allowance reset",
            TxStep::Approve => "approval",
            TxStep::Unwrap => "unwrap",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid swap request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("failed to read {what}: {source}")]
    ChainRead {
        what: &'static str,
        #[source]
        source: ChainError,
    },

    #[error("{step} transaction failed: {source}")]
    Transaction {
        step: TxStep,
        #[source]
        source: ChainError,
    },

    #[error("allowance API request failed: {0}")]
    AllowanceApi(#[source] RelayError),

    #[error("quote request failed: {0}")]
    Quote(#[source] RelayError),

    #[error("order construction failed: {0}")]
    OrderConstruction(String),

    #[error("order signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("malformed order uid '{0}'")]
    MalformedOrderUid(String),

    #[error("order submission failed: {0}")]
    Submit(#[source] RelayError),

    #[error("swap interrupted during {0}")]
    Interrupted(SwapStage),
}

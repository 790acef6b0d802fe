use ethers::types::{Address, U256};

pub mod assets;
pub mod order;
pub mod swap_result;

pub use assets::{normalize_assets, WrapDecision, NATIVE_PLACEHOLDER, NATIVE_SENTINEL};
pub use order::{FillPolicy, OrderRequest, OrderStatus, OrderUid, Preset};
pub use swap_result::{SwapOutcome, SwapStage};

// ==================================================
// SWAP REQUEST
// ==================================================

/// One swap, as the user asked for it. Asset identifiers stay raw strings
/// until the normalizer has looked at them, since the native sentinel and
/// its alias are not tradable addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    source_asset: String,
    destination_asset: String,
    amount: U256,
    wallet: Address,
}

impl SwapRequest {
    pub fn new(
        source_asset: impl Into<String>,
        destination_asset: impl Into<String>,
        amount: U256,
        wallet: Address,
    ) -> Self {
        Self {
            source_asset: source_asset.into(),
            destination_asset: destination_asset.into(),
            amount,
            wallet,
        }
    }

    pub fn source_asset(&self) -> &str {
        &self.source_asset
    }

    pub fn destination_asset(&self) -> &str {
        &self.destination_asset
    }

    /// Amount in the source asset's smallest unit.
    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn wallet(&self) -> Address {
        self.wallet
    }
}

pub mod allowance;
pub mod signer;
pub mod wrap;

pub use allowance::{AllowanceManager, AllowanceSource, OnChainAllowance, ResetPolicy};
pub use signer::{OrderSigner, WalletSigner};
pub use wrap::WrapManager;

use ethers::types::Address;
use thiserror::Error;

/// Address zero stands for the chain's native currency.
pub const NATIVE_SENTINEL: &str = "0x0000000000000000000000000000000000000000";

/// The aggregator's own alias for the native currency.
pub const NATIVE_PLACEHOLDER: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid asset address: {0}")]
    InvalidAddress(String),

    #[error("source and destination both resolve to {0:?}")]
    SamePair(Address),

    #[error("swap amount must be greater than zero")]
    ZeroAmount,

    #[error("request wallet {request:?} is not the signing wallet {signer:?}")]
    WalletMismatch { request: Address, signer: Address },
}

/// What has to happen around the order so that it only ever trades tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapDecision {
    pub must_wrap_source: bool,
    pub must_unwrap_destination: bool,
    pub source: Address,
    pub destination: Address,
}

pub fn is_native(asset: &str) -> bool {
    let asset = asset.trim();
    asset.eq_ignore_ascii_case(NATIVE_SENTINEL) || asset.eq_ignore_ascii_case(NATIVE_PLACEHOLDER)
}

/// Swap native-currency identifiers for the wrapped token and record which
/// side needs a wrap or unwrap transaction.
pub fn normalize_assets(
    source: &str,
    destination: &str,
    wrapped_native: Address,
) -> Result<WrapDecision, RequestError> {
    let (must_wrap_source, source) = resolve(source, wrapped_native)?;
    let (must_unwrap_destination, destination) = resolve(destination, wrapped_native)?;

    if source == destination {
        return Err(RequestError::SamePair(source));
    }

    Ok(WrapDecision {
        must_wrap_source,
        must_unwrap_destination,
        source,
        destination,
    })
}

fn resolve(asset: &str, wrapped_native: Address) -> Result<(bool, Address), RequestError> {
    if is_native(asset) {
        return Ok((true, wrapped_native));
    }

    let address = asset
        .trim()
        .parse::<Address>()
        .map_err(|_| RequestError::InvalidAddress(asset.to_string()))?;

    Ok((false, address))
}

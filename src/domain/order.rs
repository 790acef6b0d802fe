use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==================================================
// EXECUTION PRESET
// ==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Fast,
    Medium,
    Slow,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Preset::Fast),
            "medium" => Ok(Preset::Medium),
            "slow" => Ok(Preset::Slow),
            other => Err(format!("unknown preset '{}'", other)),
        }
    }
}

// ==================================================
// ORDER REQUEST
// ==================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillPolicy {
    pub allow_partial_fills: bool,
    pub allow_multiple_fills: bool,
}

impl FillPolicy {
    /// The whole amount in one fill.
    pub const ALL_OR_NOTHING: FillPolicy = FillPolicy {
        allow_partial_fills: false,
        allow_multiple_fills: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub source: Address,
    pub destination: Address,
    pub amount: U256,
    pub wallet: Address,
    /// `None` pays the maker.
    pub receiver: Option<Address>,
    pub fill_policy: FillPolicy,
    pub preset: Preset,
}

impl OrderRequest {
    pub fn receiver_or_zero(&self) -> Address {
        self.receiver.unwrap_or_else(Address::zero)
    }
}

// ==================================================
// ORDER STATUS
// ==================================================

/// Relay-side order state. Only `Filled` and `Cancelled` end polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Expired,
    PartiallyFilled,
    FalsePredicate,
    NotEnoughBalanceOrAllowance,
    WrongPermit,
    InvalidSignature,
    Other(String),
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Expired => "expired",
            OrderStatus::PartiallyFilled => "partially-filled",
            OrderStatus::FalsePredicate => "false-predicate",
            OrderStatus::NotEnoughBalanceOrAllowance => "not-enough-balance-or-allowance",
            OrderStatus::WrongPermit => "wrong-permit",
            OrderStatus::InvalidSignature => "invalid-signature",
            OrderStatus::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "filled" => OrderStatus::Filled,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            "expired" => OrderStatus::Expired,
            "partially-filled" => OrderStatus::PartiallyFilled,
            "false-predicate" => OrderStatus::FalsePredicate,
            "not-enough-balance-or-allowance" => OrderStatus::NotEnoughBalanceOrAllowance,
            "wrong-permit" => OrderStatus::WrongPermit,
            "invalid-signature" => OrderStatus::InvalidSignature,
            _ => OrderStatus::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================================================
// ORDER UID
// ==================================================

/// `0x` followed by 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderUid(String);

impl OrderUid {
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix("0x")?;
        if digits.len() == 64 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

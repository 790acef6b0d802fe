use super::serde_helpers::{u256_dec, u256_dec_opt};
use crate::domain::{OrderStatus, Preset};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

// ==================================================
// QUOTE
// ==================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub from_token_address: Address,
    pub to_token_address: Address,
    #[serde(with = "u256_dec")]
    pub amount: U256,
    pub wallet_address: Address,
    pub enable_estimate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub quote_id: Option<String>,
    #[serde(with = "u256_dec")]
    pub from_token_amount: U256,
    #[serde(with = "u256_dec")]
    pub to_token_amount: U256,
    #[serde(default)]
    pub presets: Presets,
    #[serde(default, rename = "recommended_preset", alias = "recommendedPreset")]
    pub recommended_preset: Option<String>,
    #[serde(default)]
    pub settlement_address: Option<Address>,
    #[serde(default)]
    pub whitelist: Vec<Address>,

    /// The request this quote answers; filled in by the client.
    #[serde(skip)]
    pub params: QuoteParams,
}

impl Quote {
    /// The token the order should buy, as quoted.
    pub fn destination(&self) -> Address {
        self.params.to_token_address
    }

    /// The requested preset, falling back to the relay's recommendation.
    pub fn preset(&self, wanted: Preset) -> Option<(Preset, &PresetData)> {
        if let Some(data) = self.presets.get(wanted) {
            return Some((wanted, data));
        }

        let fallback = self
            .recommended_preset
            .as_deref()
            .and_then(|p| p.parse::<Preset>().ok())?;
        self.presets.get(fallback).map(|data| (fallback, data))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Presets {
    #[serde(default)]
    pub fast: Option<PresetData>,
    #[serde(default)]
    pub medium: Option<PresetData>,
    #[serde(default)]
    pub slow: Option<PresetData>,
}

impl Presets {
    pub fn get(&self, preset: Preset) -> Option<&PresetData> {
        match preset {
            Preset::Fast => self.fast.as_ref(),
            Preset::Medium => self.medium.as_ref(),
            Preset::Slow => self.slow.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetData {
    pub auction_duration: u64,
    pub start_auction_in: u64,
    pub initial_rate_bump: u64,
    #[serde(with = "u256_dec")]
    pub auction_start_amount: U256,
    #[serde(with = "u256_dec")]
    pub auction_end_amount: U256,
    #[serde(default)]
    pub points: Vec<AuctionPoint>,
    #[serde(default)]
    pub allow_partial_fills: bool,
    #[serde(default)]
    pub allow_multiple_fills: bool,
    #[serde(default)]
    pub gas_cost: Option<GasCost>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionPoint {
    pub delay: u64,
    pub coefficient: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasCost {
    pub gas_bump_estimate: u64,
    #[serde(default, with = "u256_dec_opt")]
    pub gas_price_estimate: Option<U256>,
}

// ==================================================
// ORDER SUBMISSION
// ==================================================

/// Limit order struct as the relay wants it: amounts as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderStruct {
    #[serde(with = "u256_dec")]
    pub salt: U256,
    pub maker: Address,
    pub receiver: Address,
    pub maker_asset: Address,
    pub taker_asset: Address,
    #[serde(with = "u256_dec")]
    pub making_amount: U256,
    #[serde(with = "u256_dec")]
    pub taking_amount: U256,
    #[serde(with = "u256_dec")]
    pub maker_traits: U256,
}

/// A signed order ready for the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerRequest {
    pub order: LimitOrderStruct,
    pub signature: String,
    pub extension: String,
    pub quote_id: String,
}

// ==================================================
// ORDER STATUS
// ==================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    #[serde(default)]
    pub order_hash: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default, with = "u256_dec_opt")]
    pub filled_maker_amount: Option<U256>,
    #[serde(default, with = "u256_dec_opt")]
    pub filled_auction_taker_amount: Option<U256>,
}

// ==================================================
// APPROVE API
// ==================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AllowanceResponse {
    #[serde(with = "u256_dec")]
    pub allowance: U256,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveTransaction {
    pub to: Address,
    pub data: ethers::types::Bytes,
    #[serde(default, with = "u256_dec_opt")]
    pub value: Option<U256>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: &str = r#"{
        "quoteId": "a1b2c3",
        "fromTokenAmount": "5000000000000000",
        "toTokenAmount": "3012345678901234567",
        "presets": {
            "fast": {
                "auctionDuration": 180,
                "startAuctionIn": 24,
                "initialRateBump": 84909,
                "auctionStartAmount": "3035000000000000000",
                "startAmount": "3012345678901234567",
                "auctionEndAmount": "2990000000000000000",
                "exclusiveResolver": null,
                "costInDstToken": "1234",
                "points": [{ "delay": 12, "coefficient": 50000 }],
                "allowPartialFills": false,
                "allowMultipleFills": false,
                "gasCost": { "gasBumpEstimate": 10, "gasPriceEstimate": "1000" }
            }
        },
        "recommended_preset": "fast",
        "settlementAddress": "0x2ad5004c60e16e54d5007c80ce329adde5b51ef5",
        "whitelist": ["0x1111111111111111111111111111111111111111"],
        "prices": { "usd": { "fromToken": "600", "toToken": "1" } }
    }"#;

    #[test]
    fn parses_quote_and_falls_back_to_recommended_preset() {
        let quote: Quote = serde_json::from_str(QUOTE).unwrap();
        assert_eq!(quote.quote_id.as_deref(), Some("a1b2c3"));
        assert_eq!(quote.from_token_amount, U256::exp10(15) * 5);
        assert_eq!(quote.whitelist.len(), 1);

        let (preset, data) = quote.preset(Preset::Fast).unwrap();
        assert_eq!(preset, Preset::Fast);
        assert_eq!(data.auction_duration, 180);
        assert_eq!(data.points[0].coefficient, 50000);
        assert_eq!(
            data.gas_cost.as_ref().unwrap().gas_price_estimate,
            Some(U256::from(1000))
        );

        let (preset, _) = quote.preset(Preset::Slow).unwrap();
        assert_eq!(preset, Preset::Fast);
    }

    #[test]
    fn relayer_request_uses_camel_case_and_decimal_strings() {
        let request = RelayerRequest {
            order: LimitOrderStruct {
                salt: U256::from(9),
                maker: Address::repeat_byte(0x11),
                receiver: Address::zero(),
                maker_asset: Address::repeat_byte(0x22),
                taker_asset: Address::repeat_byte(0x33),
                making_amount: U256::from(100),
                taking_amount: U256::from(200),
                maker_traits: U256::one() << 255,
            },
            signature: "0xsig".to_string(),
            extension: "0x".to_string(),
            quote_id: "q".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["quoteId"], "q");
        assert_eq!(json["order"]["makingAmount"], "100");
        assert_eq!(
            json["order"]["makerAsset"],
            "0x2222222222222222222222222222222222222222"
        );
        assert!(json["order"]["makerTraits"]
            .as_str()
            .unwrap()
            .starts_with("578960446186580977117854925043439539266"));
    }

    #[test]
    fn status_response_tolerates_missing_fields() {
        let status: OrderStatusResponse = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(status.status, OrderStatus::Pending);
        assert!(status.fills.is_empty());
    }
}

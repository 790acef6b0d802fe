use crate::client::types::{AuctionPoint, LimitOrderStruct, PresetData, Quote};
use crate::domain::OrderRequest;
use crate::execution::errors::SwapError;
use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::keccak256;
use log::debug;

// ==================================================
// CONSTANTS (limit order protocol v4)
// ==================================================

pub const AGGREGATION_ROUTER_V6: &str = "0x111111125421cA6dc452d289314280a0f8842A65";

const DOMAIN_NAME: &str = "1inch Aggregation Router";
const DOMAIN_VERSION: &str = "6";

const NO_PARTIAL_FILLS_FLAG: usize = 255;
const ALLOW_MULTIPLE_FILLS_FLAG: usize = 254;
const POST_INTERACTION_CALL_FLAG: usize = 251;
const HAS_EXTENSION_FLAG: usize = 249;

const EXPIRATION_OFFSET: usize = 80;
const NONCE_OFFSET: usize = 120;
const UINT_40_MASK: u64 = (1 << 40) - 1;

/// The whitelist size lives in 5 bits.
const MAX_WHITELIST: usize = 31;

// ==================================================
// ORDER FACTORY
// ==================================================

/// A limit order with everything needed to sign and submit it.
#[derive(Debug, Clone)]
pub struct PreparedOrder {
    pub order: LimitOrderStruct,
    pub typed_data: TypedData,
    pub extension: Bytes,
    pub quote_id: String,
    pub order_hash: String,
}

impl PreparedOrder {
    pub fn extension_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.extension))
    }
}

/// Turns a quote into a signable order.
pub trait OrderFactory: Send + Sync {
    fn create_order(
        &self,
        request: &OrderRequest,
        quote: &Quote,
    ) -> Result<PreparedOrder, SwapError>;
}

// ==================================================
// MAKER TRAITS
// ==================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MakerTraits(U256);

impl MakerTraits {
    fn flag(self, bit: usize) -> Self {
        Self(self.0 | (U256::one() << bit))
    }

    fn field(self, offset: usize, value: u64) -> Self {
        let mask = U256::from(UINT_40_MASK) << offset;
        Self((self.0 & !mask) | (U256::from(value & UINT_40_MASK) << offset))
    }

    pub fn with_expiration(self, unix_secs: u64) -> Self {
        self.field(EXPIRATION_OFFSET, unix_secs)
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.field(NONCE_OFFSET, nonce)
    }

    pub fn disable_partial_fills(self) -> Self {
        self.flag(NO_PARTIAL_FILLS_FLAG)
    }

    pub fn allow_multiple_fills(self) -> Self {
        self.flag(ALLOW_MULTIPLE_FILLS_FLAG)
    }

    pub fn enable_post_interaction(self) -> Self {
        self.flag(POST_INTERACTION_CALL_FLAG)
    }

    pub fn with_extension(self) -> Self {
        self.flag(HAS_EXTENSION_FLAG)
    }

    pub fn has(self, bit: usize) -> bool {
        self.0.bit(bit)
    }

    pub fn expiration(self) -> u64 {
        ((self.0 >> EXPIRATION_OFFSET).low_u64()) & UINT_40_MASK
    }

    pub fn value(self) -> U256 {
        self.0
    }
}

// ==================================================
// EXTENSION
// ==================================================

/// Order extension: a 32-byte word of cumulative end offsets for the first
/// eight fields, followed by the fields themselves and the custom data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension {
    pub maker_asset_suffix: Vec<u8>,
    pub taker_asset_suffix: Vec<u8>,
    pub making_amount_data: Vec<u8>,
    pub taking_amount_data: Vec<u8>,
    pub predicate: Vec<u8>,
    pub maker_permit: Vec<u8>,
    pub pre_interaction: Vec<u8>,
    pub post_interaction: Vec<u8>,
    pub custom_data: Vec<u8>,
}

impl Extension {
    fn fields(&self) -> [&Vec<u8>; 8] {
        [
            &self.maker_asset_suffix,
            &self.taker_asset_suffix,
            &self.making_amount_data,
            &self.taking_amount_data,
            &self.predicate,
            &self.maker_permit,
            &self.pre_interaction,
            &self.post_interaction,
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|f| f.is_empty()) && self.custom_data.is_empty()
    }

    pub fn encode(&self) -> Bytes {
        if self.is_empty() {
            return Bytes::new();
        }

        let mut offsets = U256::zero();
        let mut end = 0u64;
        for (i, field) in self.fields().iter().enumerate() {
            end += field.len() as u64;
            offsets = offsets | (U256::from(end) << (32 * i));
        }

        let mut out = [0u8; 32];
        offsets.to_big_endian(&mut out);

        let mut encoded = out.to_vec();
        for field in self.fields() {
            encoded.extend_from_slice(field);
        }
        encoded.extend_from_slice(&self.custom_data);
        encoded.into()
    }
}

// ==================================================
// AUCTION
// ==================================================

fn push_be(buf: &mut Vec<u8>, value: u64, width: usize) {
    let bytes = value.to_be_bytes();
    buf.extend_from_slice(&bytes[bytes.len() - width..]);
}

/// Auction curve read by the settlement extension when computing amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionDetails {
    pub gas_bump_estimate: u64,
    pub gas_price_estimate: u64,
    pub start_time: u64,
    pub duration: u64,
    pub initial_rate_bump: u64,
    pub points: Vec<AuctionPoint>,
}

impl AuctionDetails {
    pub fn from_preset(preset: &PresetData, now: u64) -> Result<Self, SwapError> {
        let start_time = now
            .checked_add(preset.start_auction_in)
            .filter(|start| start.checked_add(preset.auction_duration).is_some())
            .ok_or_else(|| {
                SwapError::OrderConstruction(format!(
                    "auction window overflows: start in {}s, duration {}s",
                    preset.start_auction_in, preset.auction_duration
                ))
            })?;

        let gas = preset.gas_cost.as_ref();
        Ok(Self {
            gas_bump_estimate: gas.map(|g| g.gas_bump_estimate).unwrap_or_default(),
            gas_price_estimate: gas
                .and_then(|g| g.gas_price_estimate)
                .map(|p| p.low_u64())
                .unwrap_or_default(),
            start_time,
            duration: preset.auction_duration,
            initial_rate_bump: preset.initial_rate_bump,
            points: preset.points.clone(),
        })
    }

    pub fn end_time(&self) -> u64 {
        self.start_time + self.duration
    }

    /// uint24 gasBump | uint32 gasPrice | uint32 start | uint24 duration |
    /// uint24 rateBump | (uint24 coefficient, uint16 delay)*
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(17 + self.points.len() * 5);
        push_be(&mut buf, self.gas_bump_estimate, 3);
        push_be(&mut buf, self.gas_price_estimate, 4);
        push_be(&mut buf, self.start_time, 4);
        push_be(&mut buf, self.duration, 3);
        push_be(&mut buf, self.initial_rate_bump, 3);
        for point in &self.points {
            push_be(&mut buf, point.coefficient, 3);
            push_be(&mut buf, point.delay, 2);
        }
        buf
    }
}

/// uint8 (whitelist size << 3) | uint32 resolving start |
/// (bytes10 resolver address tail, uint16 delay)*
fn encode_whitelist(
    whitelist: &[Address],
    resolving_start: u64,
) -> Result<Vec<u8>, SwapError> {
    if whitelist.len() > MAX_WHITELIST {
        return Err(SwapError::OrderConstruction(format!(
            "{} resolvers in whitelist, at most {} fit",
            whitelist.len(),
            MAX_WHITELIST
        )));
    }

    let mut buf = Vec::with_capacity(5 + whitelist.len() * 12);
    buf.push((whitelist.len() as u8) << 3);
    push_be(&mut buf, resolving_start, 4);
    for resolver in whitelist {
        buf.extend_from_slice(&resolver.as_bytes()[10..]);
        push_be(&mut buf, 0, 2);
    }
    Ok(buf)
}

// ==================================================
// FUSION ORDER BUILDER
// ==================================================

pub struct FusionOrderBuilder {
    chain_id: u64,
    router: Address,
    fallback_settlement: Option<Address>,
}

impl FusionOrderBuilder {
    pub fn new(chain_id: u64, router: Address) -> Self {
        Self {
            chain_id,
            router,
            fallback_settlement: None,
        }
    }

    /// Settlement extension used when the quote does not name one.
    pub fn with_fallback_settlement(mut self, settlement: Address) -> Self {
        self.fallback_settlement = Some(settlement);
        self
    }

    /// Deterministic core of `create_order`: time and randomness are inputs.
    pub fn build_at(
        &self,
        request: &OrderRequest,
        quote: &Quote,
        now: u64,
        salt_entropy: u128,
        nonce: u64,
    ) -> Result<PreparedOrder, SwapError> {
        let quote_id = quote
            .quote_id
            .clone()
            .ok_or_else(|| SwapError::OrderConstruction("quote has no id".to_string()))?;

        let (preset_name, preset) = quote.preset(request.preset).ok_or_else(|| {
            SwapError::OrderConstruction(format!("quote has no '{}' preset", request.preset))
        })?;
        if preset_name != request.preset {
            debug!("Preset {} missing from quote, using {}", request.preset, preset_name);
        }

        let settlement = quote
            .settlement_address
            .or(self.fallback_settlement)
            .ok_or_else(|| SwapError::OrderConstruction("no settlement address".to_string()))?;

        let auction = AuctionDetails::from_preset(preset, now)?;
        let auction_data = [settlement.as_bytes(), &auction.encode()[..]].concat();

        let extension = Extension {
            making_amount_data: auction_data.clone(),
            taking_amount_data: auction_data,
            post_interaction: [
                settlement.as_bytes(),
                &encode_whitelist(&quote.whitelist, auction.start_time)?[..],
            ]
            .concat(),
            ..Default::default()
        }
        .encode();

        let mut traits = MakerTraits::default()
            .with_expiration(auction.end_time())
            .with_nonce(nonce)
            .enable_post_interaction()
            .with_extension();
        if !request.fill_policy.allow_partial_fills {
            traits = traits.disable_partial_fills();
        }
        if request.fill_policy.allow_multiple_fills {
            traits = traits.allow_multiple_fills();
        }

        let order = LimitOrderStruct {
            salt: salt_for(&extension, salt_entropy),
            maker: request.wallet,
            receiver: request.receiver_or_zero(),
            maker_asset: request.source,
            taker_asset: request.destination,
            making_amount: request.amount,
            taking_amount: preset.auction_end_amount,
            maker_traits: traits.value(),
        };

        let typed_data = self.typed_data(&order)?;
        let hash = typed_data
            .encode_eip712()
            .map_err(|e| SwapError::OrderConstruction(e.to_string()))?;

        Ok(PreparedOrder {
            order,
            typed_data,
            extension,
            quote_id,
            order_hash: format!("0x{}", hex::encode(hash)),
        })
    }

    fn typed_data(&self, order: &LimitOrderStruct) -> Result<TypedData, SwapError> {
        let payload = serde_json::json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                "Order": [
                    { "name": "salt", "type": "uint256" },
                    { "name": "maker", "type": "address" },
                    { "name": "receiver", "type": "address" },
                    { "name": "makerAsset", "type": "address" },
                    { "name": "takerAsset", "type": "address" },
                    { "name": "makingAmount", "type": "uint256" },
                    { "name": "takingAmount", "type": "uint256" },
                    { "name": "makerTraits", "type": "uint256" }
                ]
            },
            "primaryType": "Order",
            "domain": {
                "name": DOMAIN_NAME,
                "version": DOMAIN_VERSION,
                "chainId": self.chain_id,
                "verifyingContract": format!("{:?}", self.router)
            },
            "message": serde_json::to_value(order)
                .map_err(|e| SwapError::OrderConstruction(e.to_string()))?
        });

        serde_json::from_value(payload).map_err(|e| SwapError::OrderConstruction(e.to_string()))
    }
}

/// High 96 bits random, low 160 bits bound to the extension hash.
fn salt_for(extension: &Bytes, entropy: u128) -> U256 {
    let low_mask = (U256::one() << 160) - 1;
    let random = U256::from(entropy) & ((U256::one() << 96) - 1);

    if extension.is_empty() {
        return random;
    }

    let hash = U256::from_big_endian(&keccak256(extension));
    (random << 160) | (hash & low_mask)
}

impl OrderFactory for FusionOrderBuilder {
    fn create_order(
        &self,
        request: &OrderRequest,
        quote: &Quote,
    ) -> Result<PreparedOrder, SwapError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let salt_entropy: u128 = rand::random();
        let nonce: u64 = rand::random::<u64>() & UINT_40_MASK;
        self.build_at(request, quote, now, salt_entropy, nonce)
    }
}

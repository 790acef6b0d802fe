//! In-memory chain and relay used by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::{AbiDecode, AbiEncode};
use ethers::types::{Address, Bytes, H256, U256};
use fusion_swap::chain::contracts::{Erc20Calls, WrappedNativeCalls};
use fusion_swap::chain::{ChainClient, ChainError, TxReceipt, TxRequest};
use fusion_swap::client::{
    OrderStatusResponse, Quote, QuoteParams, RelayApi, RelayError, RelayerRequest,
};
use fusion_swap::domain::{OrderRequest, OrderStatus, OrderUid, Preset};
use fusion_swap::execution::order_builder::{FusionOrderBuilder, AGGREGATION_ROUTER_V6};
use fusion_swap::execution::{
    CompensationPolicy, OrderFactory, PollPolicy, PreparedOrder, SwapContext, SwapError,
    SwapSettings, Swapper,
};
use fusion_swap::wallet::{OnChainAllowance, OrderSigner, ResetPolicy, WalletSigner};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Well-known development key; address 0xf39F…2266.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const WBNB: &str = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c";
pub const USDC: &str = "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d";

pub fn wbnb() -> Address {
    WBNB.parse().unwrap()
}

pub fn usdc() -> Address {
    USDC.parse().unwrap()
}

pub fn router() -> Address {
    AGGREGATION_ROUTER_V6.parse().unwrap()
}

// ==================================================
// CHAIN
// ==================================================

#[derive(Default)]
struct ChainState {
    /// (token, spender) -> allowance granted by the owner
    allowances: HashMap<(Address, Address), U256>,
    balances: HashMap<Address, U256>,
    sent: Vec<TxRequest>,
    fail_approvals: bool,
    fail_withdrawals: bool,
    /// How long a sent transaction takes to confirm
    confirm_delay: Option<Duration>,
}

/// Tracks ERC-20 allowances and wrapped balances for a single owner by
/// decoding the calldata it is sent.
pub struct MockChain {
    owner: Address,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn set_allowance(&self, token: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, spender), amount);
    }

    pub fn set_balance(&self, token: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert(token, amount);
    }

    pub fn fail_approvals(&self) {
        self.state.lock().unwrap().fail_approvals = true;
    }

    pub fn fail_withdrawals(&self) {
        self.state.lock().unwrap().fail_withdrawals = true;
    }

    /// Every transaction lands immediately but its receipt arrives after `delay`.
    pub fn slow_confirmations(&self, delay: Duration) {
        self.state.lock().unwrap().confirm_delay = Some(delay);
    }

    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn balance(&self, token: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&token)
            .copied()
            .unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    /// (token, spender, amount) of every approve sent, in order.
    pub fn approvals(&self) -> Vec<(Address, Address, U256)> {
        self.sent()
            .into_iter()
            .filter_map(|tx| match Erc20Calls::decode(&tx.data) {
                Ok(Erc20Calls::Approve(call)) => Some((tx.to, call.spender, call.amount)),
                _ => None,
            })
            .collect()
    }

    pub fn deposits(&self) -> Vec<U256> {
        self.sent()
            .into_iter()
            .filter(|tx| {
                matches!(
                    WrappedNativeCalls::decode(&tx.data),
                    Ok(WrappedNativeCalls::Deposit(_))
                )
            })
            .map(|tx| tx.value)
            .collect()
    }

    pub fn withdrawals(&self) -> Vec<U256> {
        self.sent()
            .into_iter()
            .filter_map(|tx| match WrappedNativeCalls::decode(&tx.data) {
                Ok(WrappedNativeCalls::Withdraw(call)) => Some(call.wad),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn address(&self) -> Address {
        self.owner
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let value = match Erc20Calls::decode(&data).map_err(|e| ChainError::Abi(e.to_string()))? {
            Erc20Calls::Allowance(call) => self.allowance(to, call.spender),
            Erc20Calls::BalanceOf(_) => self.balance(to),
            Erc20Calls::Approve(_) => return Err(ChainError::Rpc("approve is not a view".into())),
        };
        Ok(value.encode().into())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, ChainError> {
        let (n, delay) = self.apply(&tx)?;

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(TxReceipt {
            tx_hash: H256::from_low_u64_be(n),
            block_number: Some(n),
            gas_used: Some(U256::from(21_000)),
        })
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        Ok(U256::exp10(18))
    }
}

impl MockChain {
    /// Record `tx` and apply its effects; returns its nonce and confirmation delay.
    fn apply(&self, tx: &TxRequest) -> Result<(u64, Option<Duration>), ChainError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(tx.clone());
        let n = state.sent.len() as u64;
        let tx_hash = H256::from_low_u64_be(n);

        if let Ok(Erc20Calls::Approve(call)) = Erc20Calls::decode(&tx.data) {
            if state.fail_approvals {
                return Err(ChainError::Reverted(tx_hash));
            }
            state.allowances.insert((tx.to, call.spender), call.amount);
        } else {
            match WrappedNativeCalls::decode(&tx.data) {
                Ok(WrappedNativeCalls::Deposit(_)) => {
                    *state.balances.entry(tx.to).or_default() += tx.value;
                }
                Ok(WrappedNativeCalls::Withdraw(call)) => {
                    if state.fail_withdrawals {
                        return Err(ChainError::Reverted(tx_hash));
                    }
                    let balance = state.balances.entry(tx.to).or_default();
                    *balance = balance.saturating_sub(call.wad);
                }
                Err(e) => return Err(ChainError::Abi(e.to_string())),
            }
        }

        Ok((n, state.confirm_delay))
    }
}

// ==================================================
// RELAY
// ==================================================

/// One scripted answer to a status request.
#[derive(Debug, Clone)]
pub enum StatusStep {
    Status(&'static str),
    Fail(u16),
}

pub struct MockRelay {
    statuses: Mutex<VecDeque<StatusStep>>,
    submit_error: Option<u16>,
    submit_delay: Option<Duration>,
    quotes: Mutex<Vec<QuoteParams>>,
    submitted: Mutex<Vec<RelayerRequest>>,
    status_calls: AtomicU32,
}

impl MockRelay {
    /// Once the script runs out every poll answers `pending`.
    pub fn new(statuses: Vec<StatusStep>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            submit_error: None,
            submit_delay: None,
            quotes: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            status_calls: AtomicU32::new(0),
        }
    }

    pub fn rejecting_submit(mut self, status: u16) -> Self {
        self.submit_error = Some(status);
        self
    }

    /// Submissions are recorded on arrival but answered after `delay`.
    pub fn slow_submit(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn quotes(&self) -> Vec<QuoteParams> {
        self.quotes.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<RelayerRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

pub fn sample_quote(params: &QuoteParams) -> Quote {
    let mut quote: Quote = serde_json::from_value(serde_json::json!({
        "quoteId": "quote-1",
        "fromTokenAmount": params.amount.to_string(),
        "toTokenAmount": "3012345678901234567",
        "presets": {
            "fast": {
                "auctionDuration": 180,
                "startAuctionIn": 24,
                "initialRateBump": 84909,
                "auctionStartAmount": "3035000000000000000",
                "auctionEndAmount": "2990000000000000000",
                "points": [{ "delay": 12, "coefficient": 50000 }],
                "allowPartialFills": false,
                "allowMultipleFills": false,
                "gasCost": { "gasBumpEstimate": 10, "gasPriceEstimate": "1000" }
            }
        },
        "recommended_preset": "fast",
        "settlementAddress": "0x2ad5004c60e16e54d5007c80ce329adde5b51ef5",
        "whitelist": ["0x1111111111111111111111111111111111111111"]
    }))
    .unwrap();
    quote.params = params.clone();
    quote
}

#[async_trait]
impl RelayApi for MockRelay {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, RelayError> {
        self.quotes.lock().unwrap().push(params.clone());
        Ok(sample_quote(params))
    }

    async fn submit_order(&self, order: &RelayerRequest) -> Result<(), RelayError> {
        if let Some(status) = self.submit_error {
            return Err(RelayError::Http {
                status,
                body: r#"{"description":"order rejected"}"#.to_string(),
            });
        }
        self.submitted.lock().unwrap().push(order.clone());
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn get_order_status(&self, uid: &OrderUid) -> Result<OrderStatusResponse, RelayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusStep::Status("pending"));

        match step {
            StatusStep::Status(status) => Ok(OrderStatusResponse {
                order_hash: Some(uid.to_string()),
                status: OrderStatus::from(status.to_string()),
                fills: Vec::new(),
            }),
            StatusStep::Fail(status) => Err(RelayError::Http {
                status,
                body: "upstream unavailable".to_string(),
            }),
        }
    }
}

// ==================================================
// ORDER FACTORIES
// ==================================================

/// Builds real orders, then reports a hash the relay would never accept.
pub struct MalformedFactory(pub FusionOrderBuilder);

impl OrderFactory for MalformedFactory {
    fn create_order(
        &self,
        request: &OrderRequest,
        quote: &Quote,
    ) -> Result<PreparedOrder, SwapError> {
        let mut prepared = self.0.create_order(request, quote)?;
        prepared.order_hash = "0x1234".to_string();
        Ok(prepared)
    }
}

// ==================================================
// HARNESS
// ==================================================

pub fn signer() -> WalletSigner {
    WalletSigner::new(DEV_KEY, 56).unwrap()
}

pub fn settings() -> SwapSettings {
    SwapSettings {
        wrapped_native: wbnb(),
        preset: Preset::Fast,
        poll: PollPolicy {
            interval: Duration::from_secs(10),
            ..Default::default()
        },
        reset: ResetPolicy::default(),
        compensation: CompensationPolicy::Report,
    }
}

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub relay: Arc<MockRelay>,
    pub signer: Arc<WalletSigner>,
    pub cancel: CancellationToken,
    pub settings: SwapSettings,
    pub orders: Arc<dyn OrderFactory>,
}

impl Harness {
    pub fn new(relay: MockRelay) -> Self {
        let signer = signer();
        Self {
            chain: Arc::new(MockChain::new(signer.address())),
            relay: Arc::new(relay),
            signer: Arc::new(signer),
            cancel: CancellationToken::new(),
            settings: settings(),
            orders: Arc::new(FusionOrderBuilder::new(56, router())),
        }
    }

    pub fn wallet(&self) -> Address {
        self.signer.address()
    }

    pub fn swapper(&self) -> Swapper {
        Swapper::new(SwapContext {
            chain: self.chain.clone(),
            relay: self.relay.clone(),
            signer: self.signer.clone(),
            orders: self.orders.clone(),
            allowance_source: Arc::new(OnChainAllowance::new(self.chain.clone(), router())),
            settings: self.settings.clone(),
            cancel: self.cancel.clone(),
        })
    }
}

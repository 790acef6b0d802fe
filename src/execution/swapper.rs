use super::compensation::{Compensation, CompensationPolicy, Journal};
use super::order_builder::OrderFactory;
use super::poller::{OrderPoller, PollOutcome, PollPolicy};
use super::{until_cancelled, SwapError};
use crate::chain::{ChainClient, ChainError};
use crate::client::{QuoteParams, RelayApi, RelayError, RelayerRequest};
use crate::domain::assets::RequestError;
use crate::domain::{
    normalize_assets, FillPolicy, OrderRequest, OrderUid, Preset, SwapOutcome, SwapRequest,
    SwapStage,
};
use crate::logging::{log_rejection, log_stage, log_success};
use crate::wallet::signer::signature_hex;
use crate::wallet::{AllowanceManager, AllowanceSource, OrderSigner, ResetPolicy, WrapManager};
use ethers::types::Address;
use ethers::utils::format_ether;
use log::{error, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub wrapped_native: Address,
    pub preset: Preset,
    pub poll: PollPolicy,
    pub reset: ResetPolicy,
    pub compensation: CompensationPolicy,
}

/// Everything one swap needs, built once by the binary.
pub struct SwapContext {
    pub chain: Arc<dyn ChainClient>,
    pub relay: Arc<dyn RelayApi>,
    pub signer: Arc<dyn OrderSigner>,
    pub orders: Arc<dyn OrderFactory>,
    pub allowance_source: Arc<dyn AllowanceSource>,
    pub settings: SwapSettings,
    pub cancel: CancellationToken,
}

/// Runs the swap pipeline:
/// quote, wrap, approve, sign, submit, poll, unwrap.
pub struct Swapper {
    ctx: SwapContext,
    allowances: AllowanceManager,
    wraps: WrapManager,
}

impl Swapper {
    pub fn new(ctx: SwapContext) -> Self {
        let allowances = AllowanceManager::new(
            ctx.chain.clone(),
            ctx.allowance_source.clone(),
            ctx.settings.reset.clone(),
        );
        let wraps = WrapManager::new(ctx.chain.clone(), ctx.settings.wrapped_native);

        Self {
            ctx,
            allowances,
            wraps,
        }
    }

    pub fn context(&self) -> &SwapContext {
        &self.ctx
    }

    /// Run one swap to a terminal outcome. On failure the completed steps are
    /// reported (or undone, per the compensation policy) and the error returned.
    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapOutcome, SwapError> {
        self.execute_journaled(request).await.0
    }

    /// Same as [`Swapper::execute`], also handing back the journal of the
    /// steps that were sent.
    pub async fn execute_journaled(
        &self,
        request: &SwapRequest,
    ) -> (Result<SwapOutcome, SwapError>, Journal) {
        let mut journal = Journal::default();

        let result = match self.run(request, &mut journal).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!("❌ Swap failed at {}: {}", journal.stage, err);
                self.compensate(&journal, &err).await;
                Err(err)
            }
        };
        (result, journal)
    }

    async fn run(
        &self,
        request: &SwapRequest,
        journal: &mut Journal,
    ) -> Result<SwapOutcome, SwapError> {
        let cancel = &self.ctx.cancel;
        let settings = &self.ctx.settings;

        enter(journal, SwapStage::Init);
        if request.amount().is_zero() {
            return Err(RequestError::ZeroAmount.into());
        }
        let signer = self.ctx.signer.address();
        if request.wallet() != signer {
            return Err(RequestError::WalletMismatch {
                request: request.wallet(),
                signer,
            }
            .into());
        }

        let decision = normalize_assets(
            request.source_asset(),
            request.destination_asset(),
            settings.wrapped_native,
        )?;
        info!(
            "🔄 Swapping {} of {:?} for {:?} (wrap: {}, unwrap: {})",
            request.amount(),
            decision.source,
            decision.destination,
            decision.must_wrap_source,
            decision.must_unwrap_destination
        );

        // ===== QUOTE =====
        let params = QuoteParams {
            from_token_address: decision.source,
            to_token_address: decision.destination,
            amount: request.amount(),
            wallet_address: request.wallet(),
            enable_estimate: true,
        };
        let quote = until_cancelled(cancel, journal.stage, async {
            self.ctx.relay.get_quote(&params).await.map_err(SwapError::Quote)
        })
        .await?;
        enter(journal, SwapStage::Quoted);
        info!(
            "💱 Quote {}: {} in, {} out",
            quote.quote_id.as_deref().unwrap_or("-"),
            quote.from_token_amount,
            quote.to_token_amount
        );

        // ===== WRAP =====
        if decision.must_wrap_source {
            journal.wrap_sent(request.amount());
            let wrapped =
                until_cancelled(cancel, journal.stage, self.wraps.wrap(request.amount())).await;
            if let Err(SwapError::Transaction { source, .. }) = &wrapped {
                if matches!(source, ChainError::Reverted(_) | ChainError::Abi(_)) {
                    journal.wrapped = None;
                }
            }
            wrapped?;
            journal.wrap_confirmed();
            enter(journal, SwapStage::Wrapped);
        }

        // ===== APPROVE =====
        let receipts = until_cancelled(
            cancel,
            journal.stage,
            self.allowances.ensure(decision.source, request.amount()),
        )
        .await?;
        journal.approvals += receipts.len();
        enter(journal, SwapStage::Approved);

        // ===== BUILD, SIGN, SUBMIT =====
        let order_request = OrderRequest {
            source: decision.source,
            destination: quote.destination(),
            amount: request.amount(),
            wallet: request.wallet(),
            receiver: None,
            fill_policy: FillPolicy::ALL_OR_NOTHING,
            preset: settings.preset,
        };
        let prepared = self.ctx.orders.create_order(&order_request, &quote)?;

        let signature = until_cancelled(cancel, journal.stage, async {
            Ok(self.ctx.signer.sign_typed_data(&prepared.typed_data).await?)
        })
        .await?;

        let uid = OrderUid::parse(&prepared.order_hash)
            .ok_or_else(|| SwapError::MalformedOrderUid(prepared.order_hash.clone()))?;

        let submission = RelayerRequest {
            order: prepared.order.clone(),
            signature: signature_hex(&signature),
            extension: prepared.extension_hex(),
            quote_id: prepared.quote_id.clone(),
        };
        journal.submit_sent(uid.clone());
        let submitted = until_cancelled(cancel, journal.stage, async {
            self.ctx.relay.submit_order(&submission).await.map_err(|e| {
                log_rejection(&e.to_string());
                SwapError::Submit(e)
            })
        })
        .await;
        if let Err(SwapError::Submit(RelayError::Http { .. } | RelayError::Endpoint(_))) =
            &submitted
        {
            journal.submit_rejected();
        }
        submitted?;
        journal.submit_confirmed();
        enter(journal, SwapStage::OrderSubmitted);
        info!("📨 Order {} submitted", uid);

        // ===== POLL =====
        enter(journal, SwapStage::Polling);
        let outcome = OrderPoller::new(self.ctx.relay.as_ref(), settings.poll)
            .poll(&uid, cancel)
            .await?;

        match outcome {
            PollOutcome::Filled(_) => {}
            PollOutcome::Cancelled(_) => {
                enter(journal, SwapStage::Terminal);
                warn!("🚫 Order {} was cancelled by the relay", uid);
                return Ok(SwapOutcome::Cancelled { order_uid: uid });
            }
            PollOutcome::TimedOut { last_status, .. } => {
                return Ok(SwapOutcome::TimedOut {
                    order_uid: uid,
                    last_status,
                });
            }
        }
        journal.filled = true;
        enter(journal, SwapStage::Terminal);
        log_success(&format!("Order {} filled", uid));

        // ===== UNWRAP =====
        let mut unwrapped = None;
        if decision.must_unwrap_destination {
            unwrapped = until_cancelled(cancel, journal.stage, self.wraps.unwrap(None)).await?;
            enter(journal, SwapStage::Unwrapped);
        }

        enter(journal, SwapStage::Done);
        Ok(SwapOutcome::Filled {
            order_uid: uid,
            unwrapped,
        })
    }

    async fn compensate(&self, journal: &Journal, err: &SwapError) {
        match journal.compensation() {
            Compensation::Nothing => {}
            Compensation::OrderLive { uid, acknowledged } => {
                let state = if acknowledged { "is live" } else { "may be live" };
                warn!(
                    "⚠️  Order {} {} on the relay and may still fill; check `order_status {}`",
                    uid, state, uid
                );
            }
            Compensation::CheckWrap(amount) => {
                warn!(
                    "⚠️  Wrap of {} native was not confirmed; possibly wrapped, run `reconcile`",
                    format_ether(amount)
                );
            }
            Compensation::Reconcile(uid) => {
                warn!(
                    "⚠️  Order {} filled but its proceeds are still wrapped; run `reconcile`",
                    uid
                );
            }
            Compensation::Unwrap(amount) => {
                let interrupted = matches!(err, SwapError::Interrupted(_));
                if self.ctx.settings.compensation != CompensationPolicy::Unwrap || interrupted {
                    warn!(
                        "⚠️  {} native is still wrapped; run `reconcile` to unwrap it",
                        format_ether(amount)
                    );
                    return;
                }

                info!("↩️  Unwrapping {} wrapped by this swap", format_ether(amount));
                if let Err(e) = self.wraps.unwrap(Some(amount)).await {
                    error!("❌ Compensating unwrap failed: {}", e);
                }
            }
        }
    }
}

fn enter(journal: &mut Journal, stage: SwapStage) {
    journal.stage = stage;
    log_stage(stage);
}

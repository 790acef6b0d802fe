use crate::domain::SwapStage;
use std::future::Future;
use tokio_util::sync::CancellationToken;

pub mod compensation;
pub mod errors;
pub mod order_builder;
pub mod poller;
pub mod swapper;

pub use compensation::{Compensation, CompensationPolicy, Journal};
pub use errors::{SwapError, TxStep};
pub use order_builder::{FusionOrderBuilder, OrderFactory, PreparedOrder};
pub use poller::{Backoff, OrderPoller, PollOutcome, PollPolicy};
pub use swapper::{SwapContext, SwapSettings, Swapper};

/// Run `fut` unless the token fires first.
pub(crate) async fn until_cancelled<T, F>(
    cancel: &CancellationToken,
    stage: SwapStage,
    fut: F,
) -> Result<T, SwapError>
where
    F: Future<Output = Result<T, SwapError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SwapError::Interrupted(stage)),
        result = fut => result,
    }
}

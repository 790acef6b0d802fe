use super::order::{OrderStatus, OrderUid};
use ethers::types::U256;
use std::fmt;

/// Where the pipeline is. Errors are reported against the stage they hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    Init,
    Quoted,
    Wrapped,
    Approved,
    OrderSubmitted,
    Polling,
    Terminal,
    Unwrapped,
    Done,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapStage::Init => "INIT",
            SwapStage::Quoted => "QUOTED",
            SwapStage::Wrapped => "WRAPPED",
            SwapStage::Approved => "APPROVED",
            SwapStage::OrderSubmitted => "ORDER_SUBMITTED",
            SwapStage::Polling => "POLLING",
            SwapStage::Terminal => "TERMINAL",
            SwapStage::Unwrapped => "UNWRAPPED",
            SwapStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// How a swap ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Filled {
        order_uid: OrderUid,
        /// Wrapped balance turned back into native currency, if any.
        unwrapped: Option<U256>,
    },
    Cancelled {
        order_uid: OrderUid,
    },
    /// Gave up waiting; the order may still settle later.
    TimedOut {
        order_uid: OrderUid,
        last_status: Option<OrderStatus>,
    },
}

impl SwapOutcome {
    pub fn order_uid(&self) -> &OrderUid {
        match self {
            SwapOutcome::Filled { order_uid, .. }
            | SwapOutcome::Cancelled { order_uid }
            | SwapOutcome::TimedOut { order_uid, .. } => order_uid,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, SwapOutcome::Filled { .. })
    }
}

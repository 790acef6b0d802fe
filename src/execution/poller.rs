use super::{until_cancelled, SwapError};
use crate::client::{OrderStatusResponse, RelayApi};
use crate::domain::{OrderStatus, OrderUid, SwapStage};
use crate::logging::{log_poll, log_poll_error};
use log::warn;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    /// Double the wait after every poll, up to `max_interval`.
    Exponential { max_interval: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff: Backoff,
    /// `None` polls until the order settles.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            backoff: Backoff::Fixed,
            max_wait: None,
        }
    }
}

impl PollPolicy {
    /// Wait before poll number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max_interval } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.interval
                    .checked_mul(factor)
                    .unwrap_or(max_interval)
                    .min(max_interval)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum PollOutcome {
    Filled(OrderStatusResponse),
    Cancelled(OrderStatusResponse),
    TimedOut {
        attempts: u32,
        last_status: Option<OrderStatus>,
    },
}

/// Sleeps, asks the relay for the order status, and repeats until the order
/// is filled or cancelled. Failed status fetches are treated as transient.
pub struct OrderPoller<'a> {
    relay: &'a dyn RelayApi,
    policy: PollPolicy,
}

impl<'a> OrderPoller<'a> {
    pub fn new(relay: &'a dyn RelayApi, policy: PollPolicy) -> Self {
        Self { relay, policy }
    }

    pub async fn poll(
        &self,
        uid: &OrderUid,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, SwapError> {
        let deadline = self.policy.max_wait.map(|max| Instant::now() + max);
        let mut last_status = None;
        let mut attempt = 0u32;

        loop {
            let mut wait = self.policy.delay_for(attempt + 1);

            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    warn!(
                        "⌛ Gave up on order {} after {} polls (last status: {})",
                        uid,
                        attempt,
                        last_status
                            .as_ref()
                            .map(|s: &OrderStatus| s.to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    );
                    return Ok(PollOutcome::TimedOut {
                        attempts: attempt,
                        last_status,
                    });
                }
                wait = wait.min(deadline - now);
            }

            until_cancelled(cancel, SwapStage::Polling, async {
                sleep(wait).await;
                Ok(())
            })
            .await?;

            attempt += 1;
            let fetched = until_cancelled(cancel, SwapStage::Polling, async {
                Ok(self.relay.get_order_status(uid).await)
            })
            .await?;

            match fetched {
                Ok(response) => {
                    log_poll(attempt, &response.status);
                    match response.status {
                        OrderStatus::Filled => return Ok(PollOutcome::Filled(response)),
                        OrderStatus::Cancelled => return Ok(PollOutcome::Cancelled(response)),
                        _ => last_status = Some(response.status),
                    }
                }
                Err(e) => log_poll_error(attempt, &e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_never_changes() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(50), Duration::from_secs(10));
    }

    #[test]
    fn exponential_delay_doubles_and_caps() {
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            backoff: Backoff::Exponential {
                max_interval: Duration::from_secs(30),
            },
            max_wait: None,
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(64), Duration::from_secs(30));
    }
}

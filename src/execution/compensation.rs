use crate::domain::{OrderUid, SwapStage};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// What to do about completed steps when a later step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompensationPolicy {
    /// Log what is left behind; change nothing on chain.
    #[default]
    Report,
    /// Unwrap what this swap wrapped if no order went out.
    Unwrap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    Nothing,
    /// The wrap confirmed and no order can be using it.
    Unwrap(U256),
    /// A wrap went out but its confirmation was never seen.
    CheckWrap(U256),
    /// The order reached the relay, or may have, and may still settle.
    OrderLive {
        uid: OrderUid,
        acknowledged: bool,
    },
    /// The order filled but its proceeds are still wrapped.
    Reconcile(OrderUid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Confirmed,
}

/// Irreversible steps started or completed so far in one swap. Steps are
/// recorded as pending before they are sent, so an interruption mid-flight
/// is still reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    pub stage: SwapStage,
    pub wrapped: Option<(U256, StepState)>,
    pub approvals: usize,
    pub submitted: Option<(OrderUid, StepState)>,
    pub filled: bool,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            stage: SwapStage::Init,
            wrapped: None,
            approvals: 0,
            submitted: None,
            filled: false,
        }
    }
}

impl Journal {
    pub fn wrap_sent(&mut self, amount: U256) {
        self.wrapped = Some((amount, StepState::Pending));
    }

    pub fn wrap_confirmed(&mut self) {
        if let Some((_, state)) = self.wrapped.as_mut() {
            *state = StepState::Confirmed;
        }
    }

    pub fn submit_sent(&mut self, uid: OrderUid) {
        self.submitted = Some((uid, StepState::Pending));
    }

    pub fn submit_confirmed(&mut self) {
        if let Some((_, state)) = self.submitted.as_mut() {
            *state = StepState::Confirmed;
        }
    }

    /// The relay answered and refused the order.
    pub fn submit_rejected(&mut self) {
        self.submitted = None;
    }

    pub fn compensation(&self) -> Compensation {
        if self.filled {
            if let Some((uid, _)) = &self.submitted {
                return Compensation::Reconcile(uid.clone());
            }
        }

        match (&self.submitted, self.wrapped) {
            (Some((uid, state)), _) => Compensation::OrderLive {
                uid: uid.clone(),
                acknowledged: *state == StepState::Confirmed,
            },
            (None, Some((amount, StepState::Confirmed))) => Compensation::Unwrap(amount),
            (None, Some((amount, StepState::Pending))) => Compensation::CheckWrap(amount),
            (None, None) => Compensation::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> OrderUid {
        OrderUid::parse(&format!("0x{}", "11".repeat(32))).unwrap()
    }

    #[test]
    fn compensation_table() {
        let mut journal = Journal::default();
        assert_eq!(journal.compensation(), Compensation::Nothing);

        journal.approvals = 2;
        assert_eq!(journal.compensation(), Compensation::Nothing);

        journal.wrap_sent(U256::from(5));
        assert_eq!(journal.compensation(), Compensation::CheckWrap(U256::from(5)));

        journal.wrap_confirmed();
        assert_eq!(journal.compensation(), Compensation::Unwrap(U256::from(5)));

        journal.submit_sent(uid());
        assert_eq!(
            journal.compensation(),
            Compensation::OrderLive {
                uid: uid(),
                acknowledged: false
            }
        );

        journal.submit_confirmed();
        assert_eq!(
            journal.compensation(),
            Compensation::OrderLive {
                uid: uid(),
                acknowledged: true
            }
        );

        journal.filled = true;
        assert_eq!(journal.compensation(), Compensation::Reconcile(uid()));
    }

    #[test]
    fn rejected_submit_falls_back_to_the_wrap() {
        let mut journal = Journal::default();
        journal.wrap_sent(U256::from(9));
        journal.wrap_confirmed();
        journal.submit_sent(uid());
        journal.submit_rejected();

        assert_eq!(journal.compensation(), Compensation::Unwrap(U256::from(9)));
    }
}

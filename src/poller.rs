//! Bounded-retry receipt polling.
//!
//! A submitted transaction starts `Pending`, waits out the settle delay, and
//! then moves through at most `max_checks` receipt lookups. A missing receipt
//! and a failed lookup are treated alike: wait `retry_interval` and check
//! again. Running out of checks ends in `Abandoned`, which is reported but is
//! not an error.

use crate::events::{Event, EventSink};
use crate::provider::ChainProvider;
use crate::types::{ConfirmationOutcome, SubmittedTransaction};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub settle_delay: Duration,
    pub retry_interval: Duration,
    pub max_checks: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(15),
            retry_interval: Duration::from_secs(10),
            max_checks: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Pending,
    Checking { check: u32 },
    Done(ConfirmationOutcome),
}

pub struct ConfirmationPoller<'a, P: ?Sized> {
    provider: &'a P,
    events: &'a dyn EventSink,
    policy: ConfirmationPolicy,
}

impl<'a, P: ChainProvider + ?Sized> ConfirmationPoller<'a, P> {
    pub fn new(provider: &'a P, events: &'a dyn EventSink, policy: ConfirmationPolicy) -> Self {
        Self {
            provider,
            events,
            policy,
        }
    }

    /// Drives `tx` to a terminal outcome. Never fails: transport errors only
    /// consume checks.
    pub async fn wait(&self, tx: &SubmittedTransaction) -> ConfirmationOutcome {
        let hash = tx.hash;
        let mut state = PollState::Pending;

        loop {
            state = match state {
                PollState::Pending if self.policy.max_checks == 0 => {
                    self.events
                        .emit(Event::TransactionAbandoned { hash, checks: 0 });
                    PollState::Done(ConfirmationOutcome::Abandoned { checks: 0 })
                }
                PollState::Pending => {
                    sleep(self.policy.settle_delay).await;
                    PollState::Checking { check: 1 }
                }
                PollState::Checking { check } => {
                    let retry = match self.provider.get_receipt(hash).await {
                        Ok(Some(receipt)) if receipt.success => {
                            self.events
                                .emit(Event::TransactionConfirmed { hash, receipt });
                            PollState::Done(ConfirmationOutcome::Confirmed(receipt))
                        }
                        Ok(Some(receipt)) => {
                            self.events.emit(Event::TransactionFailed { hash, receipt });
                            PollState::Done(ConfirmationOutcome::Failed(receipt))
                        }
                        Ok(None) => {
                            if check < self.policy.max_checks {
                                self.events.emit(Event::ReceiptPending { hash, check });
                            }
                            PollState::Checking { check: check + 1 }
                        }
                        Err(e) => {
                            self.events.emit(Event::ReceiptLookupFailed {
                                hash,
                                check,
                                error: e.to_string(),
                            });
                            PollState::Checking { check: check + 1 }
                        }
                    };

                    match retry {
                        PollState::Checking { check: next } if next > self.policy.max_checks => {
                            self.events
                                .emit(Event::TransactionAbandoned { hash, checks: check });
                            PollState::Done(ConfirmationOutcome::Abandoned { checks: check })
                        }
                        PollState::Checking { .. } => {
                            sleep(self.policy.retry_interval).await;
                            retry
                        }
                        done => done,
                    }
                }
                PollState::Done(outcome) => return outcome,
            };
        }
    }
}

use crate::events::{Event, EventSink};
use crate::monitor::BalanceMonitor;
use crate::poller::{ConfirmationPolicy, ConfirmationPoller};
use crate::provider::{ChainProvider, SubmissionError, TransientError};
use crate::submitter::TransactionSubmitter;
use crate::types::{Account, AccountReport, AccountStatus};
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("could not read starting balance of {address}: {source}")]
    InitialBalance {
        address: Address,
        #[source]
        source: TransientError,
    },
    /// Remaining transfers for the account were not attempted.
    #[error("transfer {index} from {address} was rejected: {source}")]
    Submission {
        address: Address,
        index: u32,
        report: Box<AccountReport>,
        #[source]
        source: SubmissionError,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessorSettings {
    pub threshold: U256,
    pub monitor_interval: Duration,
    pub confirmation: ConfirmationPolicy,
}

/// Runs one account end to end: balance gate, background monitor, then the
/// submit/confirm loop, one transaction at a time.
pub struct AccountProcessor<P: ?Sized> {
    provider: Arc<P>,
    events: Arc<dyn EventSink>,
    submitter: TransactionSubmitter,
    settings: ProcessorSettings,
}

impl<P> AccountProcessor<P>
where
    P: ChainProvider + ?Sized + 'static,
{
    pub fn new(
        provider: Arc<P>,
        events: Arc<dyn EventSink>,
        submitter: TransactionSubmitter,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            provider,
            events,
            submitter,
            settings,
        }
    }

    pub async fn process(&self, account: &Account, count: u32) -> Result<AccountReport, ProcessError> {
        let address = account.address;
        let mut report = AccountReport::new(address);

        let balance = self
            .provider
            .get_balance(address)
            .await
            .map_err(|source| ProcessError::InitialBalance { address, source })?;
        if balance < self.settings.threshold {
            self.events.emit(Event::InsufficientBalance {
                address,
                balance,
                threshold: self.settings.threshold,
            });
            report.status = AccountStatus::InsufficientBalance;
            return Ok(report);
        }

        info!(%address, count, "Processing transactions for address");

        let monitor = BalanceMonitor::new(
            self.provider.clone(),
            self.events.clone(),
            address,
            self.settings.threshold,
            self.settings.monitor_interval,
        )
        .spawn();

        let poller = ConfirmationPoller::new(
            &*self.provider,
            &*self.events,
            self.settings.confirmation,
        );

        let mut rejected = None;
        for index in 1..=count {
            // Only observed; the loop runs to its own count.
            if monitor.low_balance() {
                debug!(%address, index, "Balance monitor reported low balance");
            }

            let tx = match self.submitter.submit(&*self.provider, account).await {
                Ok(tx) => tx,
                Err(e) => {
                    self.events.emit(Event::SubmissionRejected {
                        index,
                        address,
                        error: e.to_string(),
                    });
                    rejected = Some((index, e));
                    break;
                }
            };
            report.submitted += 1;
            self.events.emit(Event::TransactionSubmitted {
                index,
                tx: tx.clone(),
            });

            let outcome = poller.wait(&tx).await;
            report.record(&outcome);
        }

        report.low_balance = monitor.join().await;

        match rejected {
            Some((index, source)) => {
                report.status = AccountStatus::Aborted;
                Err(ProcessError::Submission {
                    address,
                    index,
                    report: Box::new(report),
                    source,
                })
            }
            None => {
                self.events.emit(Event::AccountFinished {
                    report: report.clone(),
                });
                Ok(report)
            }
        }
    }
}

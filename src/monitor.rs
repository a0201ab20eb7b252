//! Background balance watcher for a single account.

use crate::events::{Event, EventSink};
use crate::provider::ChainProvider;
use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct BalanceMonitor<P: ?Sized> {
    provider: Arc<P>,
    events: Arc<dyn EventSink>,
    address: Address,
    threshold: U256,
    interval: Duration,
}

/// Owning handle to a running monitor.
///
/// `low_balance` is written only by the monitor task and only ever goes from
/// unset to set. `shutdown` is written only by the owner. Dropping the
/// handle without joining stops and aborts the task.
pub struct MonitorHandle {
    low_balance: CancellationToken,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl MonitorHandle {
    pub fn low_balance(&self) -> bool {
        self.low_balance.is_cancelled()
    }

    /// A clone of the one-way stop signal, for readers outside the owner.
    pub fn stop_signal(&self) -> CancellationToken {
        self.low_balance.clone()
    }

    /// Stops the monitor if it is still polling and waits for it to exit.
    /// Returns whether the low-balance signal fired during the run.
    pub async fn join(mut self) -> bool {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Balance monitor task panicked");
            }
        }
        self.low_balance.is_cancelled()
    }
}

impl<P> BalanceMonitor<P>
where
    P: ChainProvider + ?Sized + 'static,
{
    pub fn new(
        provider: Arc<P>,
        events: Arc<dyn EventSink>,
        address: Address,
        threshold: U256,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            events,
            address,
            threshold,
            interval,
        }
    }

    pub fn spawn(self) -> MonitorHandle {
        let low_balance = CancellationToken::new();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.run(low_balance.clone(), shutdown.clone()));
        MonitorHandle {
            low_balance,
            shutdown,
            task: Some(task),
        }
    }

    async fn run(self, low_balance: CancellationToken, shutdown: CancellationToken) {
        loop {
            match self.provider.get_balance(self.address).await {
                Ok(balance) => {
                    self.events.emit(Event::BalanceSampled {
                        address: self.address,
                        balance,
                    });
                    if balance < self.threshold {
                        self.events.emit(Event::LowBalance {
                            address: self.address,
                            balance,
                            threshold: self.threshold,
                        });
                        low_balance.cancel();
                        break;
                    }
                }
                // A failed read says nothing about the balance; try again next tick.
                Err(e) => warn!(address = %self.address, error = %e, "Balance check failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        debug!(address = %self.address, "Balance monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{SubmissionError, TransientError};
    use crate::types::{Receipt, TransferRequest};
    use alloy::primitives::TxHash;
    use alloy::signers::local::PrivateKeySigner;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Serves balances from a script, repeating the last one forever.
    struct ScriptedBalances {
        balances: Mutex<VecDeque<u64>>,
        reads: AtomicU32,
    }

    impl ScriptedBalances {
        fn new(balances: &[u64]) -> Arc<Self> {
            Arc::new(Self {
                balances: Mutex::new(balances.iter().copied().collect()),
                reads: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ChainProvider for ScriptedBalances {
        async fn get_balance(&self, _address: Address) -> Result<U256, TransientError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let mut balances = self.balances.lock().unwrap();
            let balance = if balances.len() > 1 {
                balances.pop_front()
            } else {
                balances.front().copied()
            };
            balance
                .map(U256::from)
                .ok_or_else(|| TransientError("no balance scripted".into()))
        }

        async fn submit_transfer(
            &self,
            _signer: &PrivateKeySigner,
            _request: &TransferRequest,
        ) -> Result<TxHash, SubmissionError> {
            Err(SubmissionError::Rejected("not scripted".into()))
        }

        async fn get_receipt(&self, _hash: TxHash) -> Result<Option<Receipt>, TransientError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl EventSink for Recorder {
        fn emit(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn monitor(provider: Arc<ScriptedBalances>, events: Arc<Recorder>) -> BalanceMonitor<ScriptedBalances> {
        BalanceMonitor::new(
            provider,
            events,
            Address::repeat_byte(7),
            U256::from(100u64),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_once_balance_drops_below_threshold() {
        let provider = ScriptedBalances::new(&[500, 300, 50, 1_000]);
        let events = Arc::new(Recorder::default());
        let handle = monitor(provider.clone(), events.clone()).spawn();
        let signal = handle.stop_signal();

        signal.cancelled().await;
        assert!(handle.low_balance());

        // The task has exited: no further reads even after plenty of ticks.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 3);
        assert!(signal.is_cancelled());
        assert!(handle.join().await);

        let events = events.0.lock().unwrap();
        let samples = events
            .iter()
            .filter(|e| matches!(e, Event::BalanceSampled { .. }))
            .count();
        assert_eq!(samples, 3);
        let low = events
            .iter()
            .filter(|e| matches!(e, Event::LowBalance { .. }))
            .count();
        assert_eq!(low, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_at_interval_until_joined() {
        let provider = ScriptedBalances::new(&[1_000]);
        let events = Arc::new(Recorder::default());
        let handle = monitor(provider.clone(), events.clone()).spawn();

        // Samples at t = 0, 5, 10, 15, 20.
        tokio::time::sleep(Duration::from_millis(22_500)).await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 5);
        assert!(!handle.low_balance());

        assert!(!handle.join().await);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let provider = ScriptedBalances::new(&[1_000]);
        let events = Arc::new(Recorder::default());
        let handle = monitor(provider.clone(), events.clone()).spawn();
        let stop = handle.stop_signal();

        tokio::time::sleep(Duration::from_millis(7_500)).await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 2);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 2);
        assert!(!stop.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_do_not_stop_monitor() {
        let provider = ScriptedBalances::new(&[]);
        let events = Arc::new(Recorder::default());
        let handle = monitor(provider.clone(), events.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(provider.reads.load(Ordering::SeqCst), 3);
        assert!(!handle.join().await);
        assert!(events.0.lock().unwrap().is_empty());
    }
}

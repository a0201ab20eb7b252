//! Drips small ETH transfers from funded test-network wallets to throwaway
//! addresses.
//!
//! Each account is handled by an [`AccountProcessor`]: it skips accounts
//! below the balance threshold, runs a [`BalanceMonitor`] in the background,
//! and submits transfers strictly one after another, waiting for each to be
//! confirmed, fail, or be abandoned by the [`ConfirmationPoller`] before the
//! next one goes out.

pub mod config;
pub mod events;
pub mod keys;
pub mod monitor;
pub mod poller;
pub mod processor;
pub mod provider;
pub mod submitter;
pub mod types;

pub use config::Config;
pub use events::{Event, EventSink, TracingSink};
pub use monitor::{BalanceMonitor, MonitorHandle};
pub use poller::{ConfirmationPolicy, ConfirmationPoller};
pub use processor::{AccountProcessor, ProcessError, ProcessorSettings};
pub use provider::{ChainProvider, RpcProvider, SubmissionError, TransientError};
pub use submitter::{SampleRange, TransactionSubmitter, TransferPolicy};
pub use types::{
    Account, AccountReport, AccountStatus, ConfirmationOutcome, Receipt, SubmittedTransaction,
    TransferRequest,
};

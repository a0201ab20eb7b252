//! Observable events emitted while an account is processed.
//!
//! The core never prints. It hands every event to an [`EventSink`], and the
//! binary plugs in [`TracingSink`] to turn them into log lines.

use crate::types::{AccountReport, Receipt, SubmittedTransaction};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, TxHash, U256};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum Event {
    BalanceSampled {
        address: Address,
        balance: U256,
    },
    /// Balance fell below the threshold while the account was running.
    LowBalance {
        address: Address,
        balance: U256,
        threshold: U256,
    },
    InsufficientBalance {
        address: Address,
        balance: U256,
        threshold: U256,
    },
    TransactionSubmitted {
        index: u32,
        tx: SubmittedTransaction,
    },
    SubmissionRejected {
        index: u32,
        address: Address,
        error: String,
    },
    ReceiptPending {
        hash: TxHash,
        check: u32,
    },
    ReceiptLookupFailed {
        hash: TxHash,
        check: u32,
        error: String,
    },
    TransactionConfirmed {
        hash: TxHash,
        receipt: Receipt,
    },
    TransactionFailed {
        hash: TxHash,
        receipt: Receipt,
    },
    TransactionAbandoned {
        hash: TxHash,
        checks: u32,
    },
    AccountFinished {
        report: AccountReport,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Renders events as structured `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event {
            Event::BalanceSampled { address, balance } => {
                info!(%address, balance = %format_ether(balance), "Current balance (ETH)");
            }
            Event::LowBalance {
                address,
                balance,
                threshold,
            } => {
                warn!(
                    %address,
                    balance = %format_ether(balance),
                    threshold = %format_ether(threshold),
                    "Insufficient balance for transactions, balance monitor stopped"
                );
            }
            Event::InsufficientBalance {
                address,
                balance,
                threshold,
            } => {
                warn!(
                    %address,
                    balance = %format_ether(balance),
                    threshold = %format_ether(threshold),
                    "Insufficient or zero balance, skipping account"
                );
            }
            Event::TransactionSubmitted { index, tx } => {
                info!(
                    index,
                    hash = %tx.hash,
                    from = %tx.from,
                    to = %tx.request.to,
                    amount_eth = %tx.request.amount,
                    gas_price_gwei = %tx.request.gas_price,
                    "Transaction submitted"
                );
            }
            Event::SubmissionRejected {
                index,
                address,
                error,
            } => {
                warn!(index, %address, %error, "Transaction rejected by provider");
            }
            Event::ReceiptPending { hash, check } => {
                info!(%hash, check, "Transaction is still pending, retrying");
            }
            Event::ReceiptLookupFailed { hash, check, error } => {
                warn!(%hash, check, %error, "Error checking transaction status");
            }
            Event::TransactionConfirmed { hash, receipt } => {
                info!(
                    %hash,
                    block_number = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Transaction success"
                );
            }
            Event::TransactionFailed { hash, receipt } => {
                warn!(%hash, block_number = ?receipt.block_number, "Transaction failed");
            }
            Event::TransactionAbandoned { hash, checks } => {
                warn!(%hash, checks, "Transaction unresolved after all checks");
            }
            Event::AccountFinished { report } => {
                info!(
                    address = %report.address,
                    submitted = report.submitted,
                    confirmed = report.confirmed,
                    failed = report.failed,
                    abandoned = report.abandoned,
                    "Finished transactions for address"
                );
            }
        }
    }
}

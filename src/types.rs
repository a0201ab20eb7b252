use alloy::primitives::{Address, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use rust_decimal::Decimal;

/// A funded wallet owned by this process for the duration of the run.
#[derive(Debug, Clone)]
pub struct Account {
    pub address: Address,
    pub signer: PrivateKeySigner,
}

impl Account {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            signer,
        }
    }
}

/// One transfer to a single-use recipient.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub to: Address,
    /// Amount in ether, at the configured precision.
    pub amount: Decimal,
    pub value_wei: U256,
    /// Gas price in gwei, at the configured precision.
    pub gas_price: Decimal,
    pub gas_price_wei: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
}

#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub request: TransferRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Terminal state of the confirmation protocol for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed(Receipt),
    Failed(Receipt),
    Abandoned { checks: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Completed,
    InsufficientBalance,
    Aborted,
}

/// Per-account tally handed back to the caller for the run summary.
#[derive(Debug, Clone)]
pub struct AccountReport {
    pub address: Address,
    pub status: AccountStatus,
    pub submitted: u32,
    pub confirmed: u32,
    pub failed: u32,
    pub abandoned: u32,
    pub low_balance: bool,
}

impl AccountReport {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            status: AccountStatus::Completed,
            submitted: 0,
            confirmed: 0,
            failed: 0,
            abandoned: 0,
            low_balance: false,
        }
    }

    pub(crate) fn record(&mut self, outcome: &ConfirmationOutcome) {
        match outcome {
            ConfirmationOutcome::Confirmed(_) => self.confirmed += 1,
            ConfirmationOutcome::Failed(_) => self.failed += 1,
            ConfirmationOutcome::Abandoned { .. } => self.abandoned += 1,
        }
    }
}

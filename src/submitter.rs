//! Builds randomized transfers and hands them to the provider.

use crate::provider::{ChainProvider, SubmissionError};
use crate::types::{Account, SubmittedTransaction, TransferRequest};
use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Gas limit of a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range bound {0} is negative")]
    Negative(Decimal),
    #[error("range minimum {min} is greater than maximum {max}")]
    Inverted { min: Decimal, max: Decimal },
    #[error("{value} has more than {precision} decimal places")]
    TooPrecise { value: Decimal, precision: u32 },
    #[error("{0} is too large")]
    Overflow(Decimal),
}

/// A closed decimal range sampled at a fixed number of decimal places.
///
/// Bounds are stored as integer step counts so a sample is always exactly
/// representable at `precision` and can never fall outside `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    min_steps: u64,
    max_steps: u64,
    precision: u32,
    /// Decimals of the chain base unit relative to the sampled unit
    /// (18 for ether to wei, 9 for gwei to wei).
    unit_decimals: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub value: Decimal,
    pub base_units: U256,
}

impl SampleRange {
    fn new(
        min: Decimal,
        max: Decimal,
        precision: u32,
        unit_decimals: u32,
    ) -> Result<Self, RangeError> {
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self {
            min_steps: to_steps(min, precision)?,
            max_steps: to_steps(max, precision)?,
            precision,
            unit_decimals,
        })
    }

    /// Range of ether amounts sampled to 8 decimal places.
    pub fn ether(min: Decimal, max: Decimal) -> Result<Self, RangeError> {
        Self::new(min, max, 8, 18)
    }

    /// Range of gwei gas prices sampled to 2 decimal places.
    pub fn gwei(min: Decimal, max: Decimal) -> Result<Self, RangeError> {
        Self::new(min, max, 2, 9)
    }

    pub fn min(&self) -> Decimal {
        Decimal::new(self.min_steps as i64, self.precision)
    }

    pub fn max(&self) -> Decimal {
        Decimal::new(self.max_steps as i64, self.precision)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Sample {
        let steps = rng.gen_range(self.min_steps..=self.max_steps);
        let scale = U256::from(10u64).pow(U256::from(self.unit_decimals - self.precision));
        Sample {
            value: Decimal::new(steps as i64, self.precision),
            base_units: U256::from(steps) * scale,
        }
    }
}

fn to_steps(value: Decimal, precision: u32) -> Result<u64, RangeError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RangeError::Negative(value));
    }
    let scaled = 10u64
        .checked_pow(precision)
        .and_then(|factor| value.checked_mul(Decimal::from(factor)))
        .ok_or(RangeError::Overflow(value))?;
    if !scaled.fract().is_zero() {
        return Err(RangeError::TooPrecise { value, precision });
    }
    scaled
        .to_u64()
        .filter(|steps| *steps <= i64::MAX as u64)
        .ok_or(RangeError::Overflow(value))
}

/// Converts a whole-unit decimal (ether, gwei) into base units, truncating
/// anything finer than one base unit.
pub fn to_base_units(value: Decimal, unit_decimals: u32) -> Result<U256, RangeError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RangeError::Negative(value));
    }
    let units = 10u64
        .checked_pow(unit_decimals)
        .and_then(|factor| value.checked_mul(Decimal::from(factor)))
        .and_then(|scaled| scaled.trunc().to_u128())
        .ok_or(RangeError::Overflow(value))?;
    Ok(U256::from(units))
}

#[derive(Debug, Clone)]
pub struct TransferPolicy {
    pub amount: SampleRange,
    pub gas_price: SampleRange,
    pub chain_id: u64,
}

pub struct TransactionSubmitter {
    policy: TransferPolicy,
}

impl TransactionSubmitter {
    pub fn new(policy: TransferPolicy) -> Self {
        Self { policy }
    }

    /// Draws a fresh request. The recipient comes from a throwaway key, so
    /// collisions are possible in principle and are not checked for.
    pub fn build_request<R: Rng + ?Sized>(&self, rng: &mut R) -> TransferRequest {
        let amount = self.policy.amount.sample(rng);
        let gas_price = self.policy.gas_price.sample(rng);
        TransferRequest {
            to: fresh_recipient(),
            amount: amount.value,
            value_wei: amount.base_units,
            gas_price: gas_price.value,
            gas_price_wei: gas_price.base_units.saturating_to::<u128>(),
            gas_limit: TRANSFER_GAS_LIMIT,
            chain_id: self.policy.chain_id,
        }
    }

    pub async fn submit<P: ChainProvider + ?Sized>(
        &self,
        provider: &P,
        account: &Account,
    ) -> Result<SubmittedTransaction, SubmissionError> {
        let request = self.build_request(&mut rand::thread_rng());
        let hash = provider.submit_transfer(&account.signer, &request).await?;
        Ok(SubmittedTransaction {
            hash,
            from: account.address,
            request,
        })
    }
}

fn fresh_recipient() -> Address {
    PrivateKeySigner::random().address()
}

use crate::poller::ConfirmationPolicy;
use crate::processor::ProcessorSettings;
use crate::submitter::{SampleRange, TransferPolicy, to_base_units};
use anyhow::{Context, Result, ensure};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Sepolia.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    #[serde(default = "default_private_keys_path")]
    pub private_keys_path: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Range {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Amount per transfer in ETH, sampled to 8 decimal places.
    #[serde(default = "default_amount_eth")]
    pub amount_eth: Range,
    /// Gas price in gwei, sampled to 2 decimal places.
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: Range,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceConfig {
    #[serde(default = "default_threshold_eth")]
    pub threshold_eth: Decimal,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    #[serde(default = "default_max_checks")]
    pub max_checks: u32,
}

fn default_private_keys_path() -> String {
    "privateKeys.json".to_string()
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_amount_eth() -> Range {
    Range {
        min: Decimal::new(1, 5),
        max: Decimal::new(1, 4),
    }
}

fn default_gas_price_gwei() -> Range {
    Range {
        min: Decimal::from(9),
        max: Decimal::from(15),
    }
}

fn default_threshold_eth() -> Decimal {
    Decimal::new(1, 2)
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_settle_delay_secs() -> u64 {
    15
}

fn default_retry_interval_secs() -> u64 {
    10
}

fn default_max_checks() -> u32 {
    5
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount_eth: default_amount_eth(),
            gas_price_gwei: default_gas_price_gwei(),
        }
    }
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            threshold_eth: default_threshold_eth(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: default_settle_delay_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            max_checks: default_max_checks(),
        }
    }
}

pub const SAMPLE_CONFIG: &str = r#"# JSON-RPC endpoint of the test network
rpc_url: "https://ethereum-sepolia-rpc.publicnode.com"

# JSON array of hex private keys to send from, processed in order
private_keys_path: "privateKeys.json"
chain_id: 11155111

transfer:
  # ETH per transfer, sampled uniformly to 8 decimal places
  amount_eth: { min: "0.00001", max: "0.0001" }
  # Gas price in gwei, sampled uniformly to 2 decimal places
  gas_price_gwei: { min: "9", max: "15" }

balance:
  # Accounts below this balance (ETH) are skipped
  threshold_eth: "0.01"
  poll_interval_secs: 5

confirmation:
  settle_delay_secs: 15
  retry_interval_secs: 10
  max_checks: 5
"#;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).context("Failed to open config file")?;
        let config: Config =
            serde_yaml::from_reader(file).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.transfer_policy()?;
        self.processor_settings()?;
        ensure!(
            self.balance.poll_interval_secs > 0,
            "balance.poll_interval_secs must be greater than zero"
        );
        ensure!(
            self.confirmation.retry_interval_secs > 0,
            "confirmation.retry_interval_secs must be greater than zero"
        );
        ensure!(
            self.confirmation.max_checks >= 1,
            "confirmation.max_checks must be at least 1"
        );
        Ok(())
    }

    pub fn transfer_policy(&self) -> Result<TransferPolicy> {
        let amount = self.transfer.amount_eth;
        let gas_price = self.transfer.gas_price_gwei;
        Ok(TransferPolicy {
            amount: SampleRange::ether(amount.min, amount.max)
                .context("Invalid transfer.amount_eth range")?,
            gas_price: SampleRange::gwei(gas_price.min, gas_price.max)
                .context("Invalid transfer.gas_price_gwei range")?,
            chain_id: self.chain_id,
        })
    }

    pub fn processor_settings(&self) -> Result<ProcessorSettings> {
        Ok(ProcessorSettings {
            threshold: to_base_units(self.balance.threshold_eth, 18)
                .context("Invalid balance.threshold_eth")?,
            monitor_interval: Duration::from_secs(self.balance.poll_interval_secs),
            confirmation: ConfirmationPolicy {
                settle_delay: Duration::from_secs(self.confirmation.settle_delay_secs),
                retry_interval: Duration::from_secs(self.confirmation.retry_interval_secs),
                max_checks: self.confirmation.max_checks,
            },
        })
    }
}

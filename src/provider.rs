use crate::types::{Receipt, TransferRequest};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// The provider refused a transfer, or it could not be built and signed.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to sign transfer: {0}")]
    Signing(String),
    #[error("nonce lookup failed: {0}")]
    Nonce(String),
    #[error("provider rejected transfer: {0}")]
    Rejected(String),
}

/// A read against the provider failed in transport; the caller may retry.
#[derive(Debug, Error)]
#[error("transient provider error: {0}")]
pub struct TransientError(pub String);

/// Everything the core needs from the chain. Implementations must be usable
/// from several tasks at once; every call is an independent request.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256, TransientError>;

    async fn submit_transfer(
        &self,
        signer: &PrivateKeySigner,
        request: &TransferRequest,
    ) -> Result<TxHash, SubmissionError>;

    async fn get_receipt(&self, hash: TxHash) -> Result<Option<Receipt>, TransientError>;
}

/// JSON-RPC provider over HTTP.
pub struct RpcProvider<P> {
    inner: P,
}

pub fn connect_http(rpc_url: &str) -> anyhow::Result<RpcProvider<impl Provider + use<>>> {
    let url: Url = rpc_url
        .parse()
        .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;
    Ok(RpcProvider {
        inner: ProviderBuilder::new().on_http(url),
    })
}

#[async_trait]
impl<P> ChainProvider for RpcProvider<P>
where
    P: Provider + Send + Sync,
{
    async fn get_balance(&self, address: Address) -> Result<U256, TransientError> {
        self.inner
            .get_balance(address)
            .await
            .map_err(|e| TransientError(e.to_string()))
    }

    async fn submit_transfer(
        &self,
        signer: &PrivateKeySigner,
        request: &TransferRequest,
    ) -> Result<TxHash, SubmissionError> {
        let from = signer.address();
        let nonce = self
            .inner
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(|e| SubmissionError::Nonce(e.to_string()))?;

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(request.to)
            .with_value(request.value_wei)
            .with_gas_limit(request.gas_limit)
            .with_gas_price(request.gas_price_wei)
            .with_chain_id(request.chain_id)
            .with_nonce(nonce);

        let wallet = EthereumWallet::from(signer.clone());
        let envelope = tx
            .build(&wallet)
            .await
            .map_err(|e| SubmissionError::Signing(e.to_string()))?;

        debug!(%from, nonce, to = %request.to, "Broadcasting signed transfer");

        let pending = self
            .inner
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| SubmissionError::Rejected(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn get_receipt(&self, hash: TxHash) -> Result<Option<Receipt>, TransientError> {
        let receipt = self
            .inner
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| TransientError(e.to_string()))?;

        Ok(receipt.map(|r| Receipt {
            success: r.status(),
            block_number: r.block_number,
            gas_used: r.gas_used,
        }))
    }
}

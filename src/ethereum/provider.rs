use alloy::{
    network::EthereumWallet,
    primitives::{Bytes, Log, B256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use super::{utils, Receipt};

/// The node boundary: every request the orchestrator makes goes through here.
///
/// Each method is a single in-flight request; nothing in the implementations
/// retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64>;

    /// `Ok(None)` means the transaction is not in a block yet.
    async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>>;

    async fn get_network_id(&self) -> Result<String>;
}

/// JSON-RPC transport over an alloy HTTP provider.
#[derive(Debug, Clone)]
pub struct RpcTransport<P> {
    provider: P,
}

impl<P> RpcTransport<P>
where
    P: Provider<Http<Client>> + Send + Sync + 'static,
{
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// Connects to a node that signs with its own unlocked accounts
/// (`eth_sendTransaction` with a `from` address).
pub fn connect_http(rpc_url: &str) -> Result<Arc<dyn Transport>> {
    let url = rpc_url
        .parse()
        .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", rpc_url, e))?;
    let provider = ProviderBuilder::new().on_http(url);
    Ok(Arc::new(RpcTransport::new(provider)))
}

/// Connects with a local signer; transactions are filled and signed client-side.
pub fn connect_with_signer(rpc_url: &str, private_key: &str) -> Result<Arc<dyn Transport>> {
    let private_key = private_key.trim();
    let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let signer = PrivateKeySigner::from_str(private_key)
        .map_err(|e| anyhow!("Invalid private key: {}", e))?;
    tracing::info!("Signing transactions as {:?}", signer.address());

    let url = rpc_url
        .parse()
        .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", rpc_url, e))?;
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);
    Ok(Arc::new(RpcTransport::new(provider)))
}

#[async_trait]
impl<P> Transport for RpcTransport<P>
where
    P: Provider<Http<Client>> + Send + Sync + 'static,
{
    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.provider
            .call(&request)
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))?;
        Ok(*pending.tx_hash())
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(&request)
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))
    }

    async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))?;

        Ok(receipt.map(|receipt| {
            let logs = receipt
                .inner
                .logs()
                .iter()
                .map(|log| {
                    Log::new_unchecked(log.address(), log.topics().to_vec(), log.data().data.clone())
                })
                .collect();

            Receipt {
                transaction_hash: receipt.transaction_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used as u64,
                status: receipt.status(),
                contract_address: receipt.contract_address,
                logs,
            }
        }))
    }

    async fn get_network_id(&self) -> Result<String> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| anyhow!(utils::interpret_rpc_error(&e.to_string())))?;
        Ok(chain_id.to_string())
    }
}

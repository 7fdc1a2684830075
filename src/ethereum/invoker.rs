use alloy::{
    dyn_abi::DynSolValue,
    network::TransactionBuilder,
    primitives::{Address, Bytes, B256},
    rpc::types::TransactionRequest,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    abi::CallSpec,
    confirmation::{ConfirmationTracker, PendingConfirmation},
    params::TxOptions,
    provider::Transport,
    ContractError, Receipt, TxOutcome,
};

fn call_request(to: Address, input: Bytes, options: &TxOptions) -> TransactionRequest {
    options.apply(TransactionRequest::default().with_to(to).with_input(input))
}

/// Read-only calls: one request, no receipt, no retry.
#[derive(Clone)]
pub struct ReadInvoker {
    transport: Arc<dyn Transport>,
    address: Address,
}

impl ReadInvoker {
    pub fn new(transport: Arc<dyn Transport>, address: Address) -> Self {
        Self { transport, address }
    }

    pub async fn invoke_read(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<Vec<DynSolValue>, ContractError> {
        let input = spec.encode_input(args)?;
        debug!(method = %spec.name(), to = %self.address, "eth_call");

        let output = self
            .transport
            .call(call_request(self.address, input, options))
            .await
            .map_err(|e| ContractError::Transport {
                method: spec.name().to_string(),
                message: e.to_string(),
            })?;

        spec.decode_output(&output)
    }

    pub async fn estimate_gas(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<u64, ContractError> {
        let input = spec.encode_input(args)?;
        self.transport
            .estimate_gas(call_request(self.address, input, options))
            .await
            .map_err(|e| ContractError::Transport {
                method: spec.name().to_string(),
                message: e.to_string(),
            })
    }
}

/// State-changing calls. Each submission sends exactly one transaction;
/// confirmation is handed to the tracker.
#[derive(Clone)]
pub struct TransactionSubmitter {
    transport: Arc<dyn Transport>,
    tracker: ConfirmationTracker,
    address: Option<Address>,
}

impl TransactionSubmitter {
    pub fn new(transport: Arc<dyn Transport>, tracker: ConfirmationTracker, address: Address) -> Self {
        Self {
            transport,
            tracker,
            address: Some(address),
        }
    }

    /// A submitter with no target, for contract creation.
    pub fn for_deployment(transport: Arc<dyn Transport>, tracker: ConfirmationTracker) -> Self {
        Self {
            transport,
            tracker,
            address: None,
        }
    }

    pub fn tracker(&self) -> &ConfirmationTracker {
        &self.tracker
    }

    async fn send_request(
        &self,
        method: &str,
        request: TransactionRequest,
    ) -> Result<B256, ContractError> {
        let tx_hash = self
            .transport
            .send_transaction(request)
            .await
            .map_err(|e| ContractError::Submission {
                method: method.to_string(),
                message: e.to_string(),
            })?;
        info!(method = %method, tx_hash = ?tx_hash, "transaction submitted");
        Ok(tx_hash)
    }

    /// Sends the transaction and returns its hash without waiting for a receipt.
    pub async fn send(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<B256, ContractError> {
        let to = self.address.ok_or_else(|| {
            ContractError::abi(spec.name(), "no contract address to send the transaction to")
        })?;
        let input = spec.encode_input(args)?;
        self.send_request(spec.name(), call_request(to, input, options))
            .await
    }

    /// Sends the transaction and starts confirming it.
    pub async fn submit(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<PendingConfirmation<TxOutcome>, ContractError> {
        let tx_hash = self.send(spec, args, options).await?;
        self.tracker.spawn(tx_hash)
    }

    /// Sends a contract-creation transaction carrying `code`. Resolves to the
    /// receipt, whose `contract_address` is the new instance.
    pub async fn submit_deployment(
        &self,
        contract: &str,
        code: Bytes,
        options: &TxOptions,
    ) -> Result<PendingConfirmation<Receipt>, ContractError> {
        let request = options.apply(TransactionRequest::default().with_deploy_code(code));
        let tx_hash = self.send_request(contract, request).await?;
        self.tracker.spawn_receipt(tx_hash)
    }

    /// Re-polls a hash whose earlier confirmation timed out.
    pub fn confirm(&self, tx_hash: B256) -> Result<PendingConfirmation<TxOutcome>, ContractError> {
        self.tracker.spawn(tx_hash)
    }
}

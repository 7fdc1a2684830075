use alloy::{
    primitives::{Address, Bytes, B256},
    rpc::types::TransactionRequest,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

use super::{provider::Transport, Receipt};

/// Scripted transport for tests. Counts every request it serves.
#[derive(Default)]
pub(crate) struct MockTransport {
    network_id: Mutex<Option<String>>,
    call_results: Mutex<VecDeque<Result<Bytes, String>>>,
    send_results: Mutex<VecDeque<Result<B256, String>>>,
    receipts: Mutex<VecDeque<Result<Option<Receipt>, String>>>,
    receipt_fallback: Mutex<Option<Receipt>>,
    gas_estimate: Mutex<Option<u64>>,
    requests: Mutex<Vec<TransactionRequest>>,
    poll_times: Mutex<Vec<Instant>>,
    total_requests: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_network_id(self, id: &str) -> Self {
        *self.network_id.lock().unwrap() = Some(id.to_string());
        self
    }

    pub(crate) fn with_call_result(self, result: impl Into<Bytes>) -> Self {
        self.call_results
            .lock()
            .unwrap()
            .push_back(Ok(result.into()));
        self
    }

    pub(crate) fn with_call_error(self, message: &str) -> Self {
        self.call_results
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn with_send_result(self, tx_hash: B256) -> Self {
        self.send_results.lock().unwrap().push_back(Ok(tx_hash));
        self
    }

    pub(crate) fn with_send_error(self, message: &str) -> Self {
        self.send_results
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn with_gas_estimate(self, gas: u64) -> Self {
        *self.gas_estimate.lock().unwrap() = Some(gas);
        self
    }

    /// Returns `None` for the first `attempt - 1` receipt queries, then `receipt`.
    pub(crate) fn with_receipt_on_attempt(self, attempt: usize, receipt: Receipt) -> Self {
        {
            let mut receipts = self.receipts.lock().unwrap();
            for _ in 1..attempt {
                receipts.push_back(Ok(None));
            }
            receipts.push_back(Ok(Some(receipt.clone())));
        }
        *self.receipt_fallback.lock().unwrap() = Some(receipt);
        self
    }

    pub(crate) fn with_receipt_error_on_attempt(self, attempt: usize, message: &str) -> Self {
        {
            let mut receipts = self.receipts.lock().unwrap();
            for _ in 1..attempt {
                receipts.push_back(Ok(None));
            }
            receipts.push_back(Err(message.to_string()));
        }
        self
    }

    pub(crate) fn total_requests(&self) -> usize {
        self.total_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn receipt_polls(&self) -> usize {
        self.poll_times.lock().unwrap().len()
    }

    pub(crate) fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().unwrap().clone()
    }

    pub(crate) fn requests(&self) -> Vec<TransactionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: Option<TransactionRequest>) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(request) = request {
            self.requests.lock().unwrap().push(request);
        }
    }
}

pub(crate) fn receipt(tx_hash: B256) -> Receipt {
    Receipt {
        transaction_hash: tx_hash,
        block_number: Some(42),
        gas_used: 21_000,
        status: true,
        contract_address: None,
        logs: Vec::new(),
    }
}

pub(crate) fn deployment_receipt(tx_hash: B256, address: Address) -> Receipt {
    Receipt {
        contract_address: Some(address),
        ..receipt(tx_hash)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.record(Some(request));
        match self.call_results.lock().unwrap().pop_front() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Bytes::new()),
        }
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        self.record(Some(request));
        match self.send_results.lock().unwrap().pop_front() {
            Some(Ok(hash)) => Ok(hash),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(B256::repeat_byte(0xee)),
        }
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        self.record(Some(request));
        Ok(self.gas_estimate.lock().unwrap().unwrap_or(21_000))
    }

    async fn get_transaction_receipt(&self, _tx_hash: B256) -> Result<Option<Receipt>> {
        self.record(None);
        self.poll_times.lock().unwrap().push(Instant::now());
        match self.receipts.lock().unwrap().pop_front() {
            Some(Ok(receipt)) => Ok(receipt),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(self.receipt_fallback.lock().unwrap().clone()),
        }
    }

    async fn get_network_id(&self) -> Result<String> {
        self.record(None);
        self.network_id
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("connection refused"))
    }
}

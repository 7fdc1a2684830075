//! Receipt polling for submitted transactions.
//!
//! A submitted hash moves `Submitted → Polling → {Confirmed | TimedOut | TransportFailed}`.
//! Polls never overlap: each attempt completes before the fixed interval starts.
//! A failed receipt query ends the loop immediately; only the timeout bounds it
//! otherwise.

use alloy::primitives::{Address, B256};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{
    events::{EventDecoder, EventTopicTable},
    provider::Transport,
    ContractError, Receipt, TransactionResult, TxOutcome,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(240_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Zero disables the bound.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Decode the receipt's logs and return them with the hash.
    pub extended: bool,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            extended: false,
        }
    }
}

impl ConfirmationPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    Submitted,
    Polling,
    Confirmed,
    TimedOut,
    TransportFailed,
}

impl ConfirmationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConfirmationState::Confirmed
                | ConfirmationState::TimedOut
                | ConfirmationState::TransportFailed
        )
    }
}

impl fmt::Display for ConfirmationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfirmationState::Submitted => "submitted",
            ConfirmationState::Polling => "polling",
            ConfirmationState::Confirmed => "confirmed",
            ConfirmationState::TimedOut => "timed out",
            ConfirmationState::TransportFailed => "transport failed",
        };
        f.write_str(name)
    }
}

/// Timing state of one hash under confirmation.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub tx_hash: B256,
    pub submitted_at: Instant,
    pub timeout: Duration,
    pub attempts: usize,
    pub state: ConfirmationState,
}

impl PendingTransaction {
    pub fn new(tx_hash: B256, timeout: Duration) -> Self {
        Self {
            tx_hash,
            submitted_at: Instant::now(),
            timeout,
            attempts: 0,
            state: ConfirmationState::Submitted,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        !self.timeout.is_zero() && self.elapsed() > self.timeout
    }

    fn transition(&mut self, state: ConfirmationState) {
        debug!(
            tx_hash = ?self.tx_hash,
            from = %self.state,
            to = %state,
            attempts = self.attempts,
            "confirmation state changed"
        );
        self.state = state;
    }
}

/// Hashes with a live poll loop. At most one loop runs per hash.
#[derive(Debug, Clone, Default)]
pub struct PendingRegistry {
    hashes: Arc<Mutex<HashSet<B256>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<B256>> {
        self.hashes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, tx_hash: B256) -> Result<PendingGuard, ContractError> {
        if !self.lock().insert(tx_hash) {
            return Err(ContractError::AlreadyPending { tx_hash });
        }
        Ok(PendingGuard {
            registry: self.clone(),
            tx_hash,
        })
    }

    pub fn is_pending(&self, tx_hash: &B256) -> bool {
        self.lock().contains(tx_hash)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases the hash when the poll loop ends, however it ends.
#[derive(Debug)]
pub struct PendingGuard {
    registry: PendingRegistry,
    tx_hash: B256,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.tx_hash);
    }
}

/// Handle to a spawned confirmation loop.
///
/// Dropping it stops observing the result; the loop keeps running until it
/// confirms, fails or times out.
#[derive(Debug)]
pub struct PendingConfirmation<T> {
    tx_hash: B256,
    handle: JoinHandle<Result<T, ContractError>>,
}

impl<T> PendingConfirmation<T> {
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }
}

impl<T> Future for PendingConfirmation<T> {
    type Output = Result<T, ContractError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(ContractError::TaskFailed {
                tx_hash: this.tx_hash,
                message: e.to_string(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Clone)]
pub struct ConfirmationTracker {
    transport: Arc<dyn Transport>,
    policy: ConfirmationPolicy,
    events: Arc<EventTopicTable>,
    address: Option<Address>,
    registry: PendingRegistry,
}

impl ConfirmationTracker {
    pub fn new(
        transport: Arc<dyn Transport>,
        policy: ConfirmationPolicy,
        events: Arc<EventTopicTable>,
        registry: PendingRegistry,
    ) -> Self {
        Self {
            transport,
            policy,
            events,
            address: None,
            registry,
        }
    }

    /// Contract whose events are expected in receipts; used for log context.
    pub fn for_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &PendingRegistry {
        &self.registry
    }

    /// Polls until a receipt appears, the query fails or the timeout passes.
    /// Only reachable through `spawn*`, which hold the hash in the registry.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt, ContractError> {
        let mut pending = PendingTransaction::new(tx_hash, self.policy.timeout);
        pending.transition(ConfirmationState::Polling);

        loop {
            pending.attempts += 1;
            debug!(tx_hash = ?tx_hash, attempt = pending.attempts, "polling for receipt");

            let receipt = match self.transport.get_transaction_receipt(tx_hash).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    pending.transition(ConfirmationState::TransportFailed);
                    return Err(ContractError::Transport {
                        method: "eth_getTransactionReceipt".to_string(),
                        message: e.to_string(),
                    });
                }
            };

            if let Some(receipt) = receipt {
                pending.transition(ConfirmationState::Confirmed);
                info!(
                    tx_hash = ?tx_hash,
                    block = ?receipt.block_number,
                    attempts = pending.attempts,
                    "transaction confirmed"
                );
                return Ok(receipt);
            }

            if pending.is_expired() {
                pending.transition(ConfirmationState::TimedOut);
                let elapsed = pending.elapsed();
                warn!(
                    tx_hash = ?tx_hash,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "no receipt before timeout"
                );
                return Err(ContractError::Timeout {
                    tx_hash,
                    elapsed,
                    timeout: pending.timeout,
                });
            }

            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    /// Waits for the receipt and shapes the result by the policy's `extended` flag.
    async fn track(&self, tx_hash: B256) -> Result<TxOutcome, ContractError> {
        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !self.policy.extended {
            return Ok(TxOutcome::Hash(tx_hash));
        }
        Ok(TxOutcome::Extended(self.decode_receipt(tx_hash, receipt)))
    }

    pub fn decode_receipt(&self, tx_hash: B256, receipt: Receipt) -> TransactionResult {
        let address = self
            .address
            .or(receipt.contract_address)
            .unwrap_or_default();
        let logs = EventDecoder::new(&self.events, address).decode(&receipt.logs);
        TransactionResult {
            tx: tx_hash,
            receipt,
            logs,
        }
    }

    /// Starts the confirmation loop for `tx_hash` on the runtime.
    pub fn spawn(&self, tx_hash: B256) -> Result<PendingConfirmation<TxOutcome>, ContractError> {
        self.spawn_task(tx_hash, move |tracker| async move {
            tracker.track(tx_hash).await
        })
    }

    /// Like [`spawn`](Self::spawn) but always resolves to the raw receipt.
    pub fn spawn_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<PendingConfirmation<Receipt>, ContractError> {
        self.spawn_task(tx_hash, move |tracker| async move {
            tracker.wait_for_receipt(tx_hash).await
        })
    }

    fn spawn_task<T, F, Fut>(
        &self,
        tx_hash: B256,
        run: F,
    ) -> Result<PendingConfirmation<T>, ContractError>
    where
        T: Send + 'static,
        F: FnOnce(ConfirmationTracker) -> Fut,
        Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
    {
        let guard = self.registry.register(tx_hash)?;
        let task = run(self.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            task.await
        });
        Ok(PendingConfirmation { tx_hash, handle })
    }
}

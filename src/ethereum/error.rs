use alloy::primitives::B256;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by contract factories, instances and the confirmation tracker.
///
/// Every variant reaches the caller as a failed result; nothing is swallowed and
/// the only retry anywhere is the bounded receipt poll.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The node rejected a state-changing request before it was included.
    #[error("{method} failed to send: {message}")]
    Submission { method: String, message: String },

    /// A read call, gas estimate, receipt query or network query failed.
    #[error("{method} failed: {message}")]
    Transport { method: String, message: String },

    /// No receipt was observed within the configured bound. The transaction
    /// may still be mined later.
    #[error(
        "Transaction {tx_hash} wasn't processed in {} seconds! (waited {} ms)",
        timeout.as_secs(),
        elapsed.as_millis()
    )]
    Timeout {
        tx_hash: B256,
        elapsed: Duration,
        timeout: Duration,
    },

    #[error(
        "{contract} contains unresolved libraries. You must deploy and link the following libraries before you can deploy a new version of {contract}: {}",
        libraries.join(", ")
    )]
    UnresolvedLibraries {
        contract: String,
        libraries: Vec<String>,
    },

    #[error("{contract} error: Can't find artifacts for network id '{network_id}'")]
    UnknownNetwork {
        contract: String,
        network_id: String,
    },

    #[error("Invalid address passed to {contract}: {address} ({reason})")]
    InvalidAddress {
        contract: String,
        address: String,
        reason: String,
    },

    #[error("Cannot find deployed address: {contract} not deployed or address not set.")]
    NotDeployed { contract: String },

    #[error("{contract} error: Please call set_provider() first.")]
    ProviderNotSet { contract: String },

    #[error("{contract} configuration is frozen: instances have already been created")]
    ConfigurationFrozen { contract: String },

    #[error("{contract} has no function named '{method}'")]
    UnknownMethod { contract: String, method: String },

    #[error("{method}: {message}")]
    Abi { method: String, message: String },

    #[error("{contract} error: contract binary not set. Can't deploy new instance.")]
    MissingBytecode { contract: String },

    #[error("Transaction {tx_hash} is already being tracked")]
    AlreadyPending { tx_hash: B256 },

    #[error("Invalid contract artifact: {0}")]
    Artifact(String),

    #[error("Confirmation task for {tx_hash} did not complete: {message}")]
    TaskFailed { tx_hash: B256, message: String },
}

impl ContractError {
    pub(crate) fn abi(method: &str, message: impl std::fmt::Display) -> Self {
        Self::Abi {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the transaction might still confirm: only a timeout leaves the
    /// outcome unknown.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

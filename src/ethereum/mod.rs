pub mod abi;
pub mod artifact;
pub mod confirmation;
pub mod contract;
pub mod error;
pub mod events;
pub mod factory;
pub mod invoker;
pub mod params;
pub mod provider;
pub mod utils;

#[cfg(test)]
pub(crate) mod mock;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Log, B256},
};
use serde_json::{Map, Value};

pub use error::ContractError;

/// Block-inclusion proof for a submitted transaction, as reported by the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: bool,
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
}

/// A log entry decoded against the contract's event ABI.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub event: String,
    pub address: Address,
    pub args: Vec<(String, DynSolValue)>,
}

impl DecodedEvent {
    pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
        self.args
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .map(|(_, value)| value)
    }

    pub fn to_json(&self) -> Value {
        let mut args = Map::new();
        for (name, value) in &self.args {
            args.insert(name.clone(), abi::dyn_sol_value_to_json(value));
        }
        serde_json::json!({
            "event": self.event,
            "address": format!("0x{:x}", self.address),
            "args": args,
        })
    }
}

/// Extended confirmation result: the hash, the receipt and the decoded logs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    pub tx: B256,
    pub receipt: Receipt,
    pub logs: Vec<DecodedEvent>,
}

/// What a confirmed write resolves to. Plain mode keeps only the hash;
/// extended mode carries the receipt and decoded events.
#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    Hash(B256),
    Extended(TransactionResult),
}

impl TxOutcome {
    pub fn tx_hash(&self) -> B256 {
        match self {
            TxOutcome::Hash(hash) => *hash,
            TxOutcome::Extended(result) => result.tx,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TxOutcome::Hash(hash) => Value::String(format!("0x{:x}", hash)),
            TxOutcome::Extended(result) => serde_json::json!({
                "tx": format!("0x{:x}", result.tx),
                "receipt": {
                    "blockNumber": result.receipt.block_number,
                    "gasUsed": result.receipt.gas_used,
                    "status": result.receipt.status,
                    "contractAddress": result
                        .receipt
                        .contract_address
                        .map(|address| format!("0x{:x}", address)),
                },
                "logs": result.logs.iter().map(DecodedEvent::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

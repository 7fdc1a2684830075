//! Decoding of receipt logs against a contract's event ABI.

use alloy::{
    dyn_abi::{DynSolValue, EventExt},
    json_abi::{Event, JsonAbi},
    primitives::{Address, Log, B256},
};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::DecodedEvent;

/// Topic → event descriptor. Loaded once per contract and network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTopicTable {
    events: HashMap<B256, Event>,
}

impl EventTopicTable {
    pub fn new(events: HashMap<B256, Event>) -> Self {
        Self { events }
    }

    /// Derives the table from the ABI's non-anonymous events.
    pub fn from_abi(abi: &JsonAbi) -> Self {
        let events = abi
            .events()
            .filter(|event| !event.anonymous)
            .map(|event| (event.selector(), event.clone()))
            .collect();
        Self { events }
    }

    pub fn get(&self, topic: &B256) -> Option<&Event> {
        self.events.get(topic)
    }

    /// Adds entries from `other`, replacing any with the same topic.
    pub fn extend(&mut self, other: &EventTopicTable) {
        self.events
            .extend(other.events.iter().map(|(k, v)| (*k, v.clone())));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn topics(&self) -> impl Iterator<Item = &B256> {
        self.events.keys()
    }
}

pub struct EventDecoder<'a> {
    table: &'a EventTopicTable,
    contract: Address,
}

impl<'a> EventDecoder<'a> {
    pub fn new(table: &'a EventTopicTable, contract: Address) -> Self {
        Self { table, contract }
    }

    /// Decodes every log whose first topic is known, in log order. Logs from
    /// other contracts or with unknown topics are dropped.
    pub fn decode(&self, logs: &[Log]) -> Vec<DecodedEvent> {
        logs.iter().filter_map(|log| self.decode_log(log)).collect()
    }

    pub fn decode_log(&self, log: &Log) -> Option<DecodedEvent> {
        let topics = log.data.topics();
        let event = match topics.first().and_then(|topic| self.table.get(topic)) {
            Some(event) => event,
            None => {
                debug!(
                    contract = %self.contract,
                    log_address = %log.address,
                    "skipping log with unknown topic"
                );
                return None;
            }
        };

        let decoded = match event.decode_log_parts(topics.iter().copied(), &log.data.data, false) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(
                    event = %event.name,
                    log_address = %log.address,
                    "failed to decode log: {}",
                    e
                );
                return None;
            }
        };

        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let mut args: Vec<(String, DynSolValue)> = Vec::with_capacity(event.inputs.len());
        for input in &event.inputs {
            let value = if input.indexed {
                indexed.next()
            } else {
                body.next()
            }?;
            args.push((input.name.clone(), value));
        }

        Some(DecodedEvent {
            event: event.name.clone(),
            address: log.address,
            args,
        })
    }
}

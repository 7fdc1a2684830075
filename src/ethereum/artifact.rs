//! Static per-network contract records and library linking.

use alloy::{
    json_abi::{Event, JsonAbi},
    primitives::{Address, B256},
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{events::EventTopicTable, utils, ContractError};

/// Network id used for the record every artifact ships with.
pub const DEFAULT_NETWORK: &str = "default";

/// Ids tried, in order, when the node reports the main network.
pub const MAINNET_ALIASES: [&str; 3] = ["1", "live", "default"];

const PLACEHOLDER_PREFIX: &str = "__";

#[derive(Debug, Clone, Deserialize)]
struct RawNetwork {
    abi: JsonAbi,
    #[serde(default)]
    bytecode: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    events: Option<HashMap<B256, Event>>,
    #[serde(default)]
    links: BTreeMap<String, String>,
    #[serde(default)]
    updated_at: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawArtifact {
    contract_name: String,
    #[serde(default)]
    generated_with: Option<String>,
    networks: BTreeMap<String, RawNetwork>,
}

/// Everything known about a contract on one network.
#[derive(Debug, Clone)]
pub struct NetworkArtifact {
    pub abi: JsonAbi,
    /// Hex bytecode, possibly containing `__Name___` library placeholders.
    pub bytecode: String,
    pub address: Option<Address>,
    pub events: EventTopicTable,
    pub links: BTreeMap<String, Address>,
    pub updated_at: Option<u64>,
}

/// All network records of one contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub generated_with: Option<String>,
    pub networks: BTreeMap<String, NetworkArtifact>,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let raw: RawArtifact =
            serde_json::from_str(json).map_err(|e| ContractError::Artifact(e.to_string()))?;

        let mut networks = BTreeMap::new();
        for (network_id, network) in raw.networks {
            let address = match network.address.as_deref() {
                Some(address) => Some(utils::validate_address(address).map_err(|e| {
                    ContractError::Artifact(format!(
                        "{} network '{}': {}",
                        raw.contract_name, network_id, e
                    ))
                })?),
                None => None,
            };

            let mut links = BTreeMap::new();
            for (name, address) in network.links {
                let address = utils::validate_address(&address).map_err(|e| {
                    ContractError::Artifact(format!("link '{}': {}", name, e))
                })?;
                links.insert(name, address);
            }

            let events = match network.events {
                Some(events) => EventTopicTable::new(events),
                None => EventTopicTable::from_abi(&network.abi),
            };

            networks.insert(
                network_id,
                NetworkArtifact {
                    abi: network.abi,
                    bytecode: network.bytecode,
                    address,
                    events,
                    links,
                    updated_at: network.updated_at,
                },
            );
        }

        Ok(Self {
            contract_name: raw.contract_name,
            generated_with: raw.generated_with,
            networks,
        })
    }

    pub fn network(&self, network_id: &str) -> Option<&NetworkArtifact> {
        self.networks.get(network_id)
    }

    pub fn network_ids(&self) -> Vec<&str> {
        self.networks.keys().map(String::as_str).collect()
    }

    /// Maps a node-reported network id onto a configured record id.
    pub fn resolve_network_id(&self, reported: &str) -> Option<String> {
        if reported == MAINNET_ALIASES[0] {
            return MAINNET_ALIASES
                .iter()
                .find(|alias| self.networks.contains_key(**alias))
                .map(|alias| alias.to_string());
        }

        self.networks
            .contains_key(reported)
            .then(|| reported.to_string())
    }
}

/// Substitutes each linked library's address (without `0x`) for its
/// `__Name___` placeholder wherever it appears.
pub fn link_bytecode(bytecode: &str, links: &BTreeMap<String, Address>) -> String {
    let mut linked = bytecode.to_string();
    for (name, address) in links {
        let replacement = format!("{:x}", address);
        let token = format!("{PLACEHOLDER_PREFIX}{name}");
        let mut output = String::with_capacity(linked.len());
        let mut rest = linked.as_str();

        while let Some(start) = rest.find(&token) {
            let after = &rest[start + token.len()..];
            // `__Name` must be followed by padding, not by more of a longer name
            if after.starts_with(|c: char| c != '_') {
                output.push_str(&rest[..start + token.len()]);
                rest = after;
                continue;
            }
            let padding = after.len() - after.trim_start_matches('_').len();
            output.push_str(&rest[..start]);
            output.push_str(&replacement);
            rest = &after[padding..];
        }
        output.push_str(rest);
        linked = output;
    }
    linked
}

/// Names of all placeholders still present, deduplicated and sorted.
pub fn unresolved_libraries(bytecode: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    let mut rest = bytecode;

    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        let after = &rest[start + PLACEHOLDER_PREFIX.len()..];
        let name_len = after
            .find('_')
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let tail = &after[name_len..];
        let padding = tail.len() - tail.trim_start_matches('_').len();

        if !name.is_empty() && padding > 0 {
            names.insert(name.to_string());
            rest = &tail[padding..];
        } else {
            rest = &rest[start + 1..];
        }
    }

    names.into_iter().collect()
}

//! Per-contract configuration: the network record in use, linked libraries,
//! class-level defaults and the transport. Instances get a frozen snapshot.

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::{Address, Bytes},
};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use super::{
    abi::{self, MethodTable},
    artifact::{self, ContractArtifact, NetworkArtifact, DEFAULT_NETWORK},
    confirmation::{ConfirmationPolicy, ConfirmationTracker, PendingRegistry},
    contract::ContractInstance,
    events::EventTopicTable,
    invoker::TransactionSubmitter,
    params::TxOptions,
    provider::Transport,
    utils, ContractError,
};

/// Everything an instance needs, fixed once the first instance exists.
#[derive(Debug)]
pub struct ContractConfig {
    pub contract_name: String,
    pub network_id: String,
    pub abi: JsonAbi,
    pub methods: MethodTable,
    pub bytecode: String,
    pub address: Option<Address>,
    pub events: Arc<EventTopicTable>,
    pub links: BTreeMap<String, Address>,
    pub defaults: TxOptions,
    pub policy: ConfirmationPolicy,
    pub updated_at: Option<u64>,
    pub(crate) registry: PendingRegistry,
}

impl ContractConfig {
    pub(crate) fn tracker(&self, transport: Arc<dyn Transport>) -> ConfirmationTracker {
        ConfirmationTracker::new(
            transport,
            self.policy,
            self.events.clone(),
            self.registry.clone(),
        )
    }
}

pub struct ContractFactory {
    artifact: Arc<ContractArtifact>,
    /// Explicitly selected or detected network. `None` until one of those happens.
    network_id: Option<String>,
    /// Record currently loaded; starts as the default network's.
    loaded_network: String,
    network: NetworkArtifact,
    /// Links made through `link*`, reapplied over each network record.
    user_links: BTreeMap<String, Address>,
    /// Events merged from linked library factories.
    library_events: EventTopicTable,
    defaults: TxOptions,
    policy: ConfirmationPolicy,
    transport: Option<Arc<dyn Transport>>,
    registry: PendingRegistry,
    frozen: OnceLock<Arc<ContractConfig>>,
}

impl ContractFactory {
    /// Loads the default network record; no network is selected yet.
    pub fn new(artifact: ContractArtifact) -> Result<Self, ContractError> {
        let loaded_network = if artifact.networks.contains_key(DEFAULT_NETWORK) {
            DEFAULT_NETWORK.to_string()
        } else {
            artifact.networks.keys().next().cloned().ok_or_else(|| {
                ContractError::Artifact(format!("{} has no network records", artifact.contract_name))
            })?
        };
        let network = artifact
            .network(&loaded_network)
            .cloned()
            .ok_or_else(|| ContractError::Artifact(format!("missing network '{}'", loaded_network)))?;

        Ok(Self {
            artifact: Arc::new(artifact),
            network_id: None,
            loaded_network,
            network,
            user_links: BTreeMap::new(),
            library_events: EventTopicTable::default(),
            defaults: TxOptions::default(),
            policy: ConfirmationPolicy::default(),
            transport: None,
            registry: PendingRegistry::new(),
            frozen: OnceLock::new(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        Self::new(ContractArtifact::from_json(json)?)
    }

    /// A copy bound to `network_id`, carrying the current defaults, policy and
    /// transport. The copy starts unfrozen.
    pub fn with_network(&self, network_id: &str) -> Result<Self, ContractError> {
        let mut factory = Self {
            artifact: self.artifact.clone(),
            network_id: None,
            loaded_network: self.loaded_network.clone(),
            network: self.network.clone(),
            user_links: self.user_links.clone(),
            library_events: self.library_events.clone(),
            defaults: self.defaults.clone(),
            policy: self.policy,
            transport: self.transport.clone(),
            registry: self.registry.clone(),
            frozen: OnceLock::new(),
        };
        factory.set_network(network_id)?;
        Ok(factory)
    }

    pub fn contract_name(&self) -> &str {
        &self.artifact.contract_name
    }

    fn ensure_mutable(&self) -> Result<(), ContractError> {
        if self.frozen.get().is_some() {
            return Err(ContractError::ConfigurationFrozen {
                contract: self.contract_name().to_string(),
            });
        }
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }

    pub fn set_provider(&mut self, transport: Arc<dyn Transport>) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        self.transport = Some(transport);
        Ok(())
    }

    pub fn has_provider(&self) -> bool {
        self.transport.is_some()
    }

    fn transport(&self) -> Result<Arc<dyn Transport>, ContractError> {
        self.transport
            .clone()
            .ok_or_else(|| ContractError::ProviderNotSet {
                contract: self.contract_name().to_string(),
            })
    }

    pub fn networks(&self) -> Vec<&str> {
        self.artifact.network_ids()
    }

    pub fn set_network(&mut self, network_id: &str) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        let mut network = self
            .artifact
            .network(network_id)
            .cloned()
            .ok_or_else(|| ContractError::UnknownNetwork {
                contract: self.contract_name().to_string(),
                network_id: network_id.to_string(),
            })?;

        network.links.extend(self.user_links.clone());
        network.events.extend(&self.library_events);

        debug!(contract = %self.contract_name(), network = %network_id, "network selected");
        self.network = network;
        self.loaded_network = network_id.to_string();
        self.network_id = Some(network_id.to_string());
        Ok(())
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// Selects the network the transport is connected to, unless one is
    /// already selected.
    pub async fn detect_network(&mut self) -> Result<String, ContractError> {
        if let Some(network_id) = &self.network_id {
            return Ok(network_id.clone());
        }
        if let Some(config) = self.frozen.get() {
            return Ok(config.network_id.clone());
        }

        let transport = self.transport()?;
        let reported = transport
            .get_network_id()
            .await
            .map_err(|e| ContractError::Transport {
                method: "net_version".to_string(),
                message: e.to_string(),
            })?;

        let network_id = self.artifact.resolve_network_id(&reported).ok_or_else(|| {
            ContractError::UnknownNetwork {
                contract: self.contract_name().to_string(),
                network_id: reported.clone(),
            }
        })?;

        info!(
            contract = %self.contract_name(),
            reported = %reported,
            network = %network_id,
            "detected network"
        );
        self.set_network(&network_id)?;
        Ok(network_id)
    }

    pub fn address(&self) -> Option<Address> {
        self.network.address
    }

    pub fn set_address(&mut self, address: &str) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        self.network.address = Some(self.parse_address(address)?);
        Ok(())
    }

    pub fn updated_at(&self) -> Option<u64> {
        self.network.updated_at
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.network.abi
    }

    pub fn events(&self) -> &EventTopicTable {
        &self.network.events
    }

    pub fn links(&self) -> &BTreeMap<String, Address> {
        &self.network.links
    }

    pub fn unlinked_binary(&self) -> &str {
        &self.network.bytecode
    }

    /// Bytecode with every linked library's address substituted in.
    pub fn binary(&self) -> String {
        artifact::link_bytecode(&self.network.bytecode, &self.network.links)
    }

    fn parse_address(&self, address: &str) -> Result<Address, ContractError> {
        utils::validate_address(address).map_err(|e| ContractError::InvalidAddress {
            contract: self.contract_name().to_string(),
            address: address.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn link(&mut self, name: &str, address: &str) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        let address = self.parse_address(address)?;
        debug!(contract = %self.contract_name(), library = %name, address = %address, "linked library");
        self.user_links.insert(name.to_string(), address);
        self.network.links.insert(name.to_string(), address);
        Ok(())
    }

    pub fn link_all(&mut self, links: &BTreeMap<String, String>) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        for (name, address) in links {
            self.link(name, address)?;
        }
        Ok(())
    }

    /// Links a deployed library by its contract name and merges its events so
    /// they decode in this contract's receipts.
    pub fn link_library(&mut self, library: &ContractFactory) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        let address = library.address().ok_or_else(|| ContractError::NotDeployed {
            contract: library.contract_name().to_string(),
        })?;
        let name = library.contract_name().to_string();
        self.user_links.insert(name.clone(), address);
        self.network.links.insert(name, address);
        self.library_events.extend(library.events());
        self.network.events.extend(library.events());
        Ok(())
    }

    pub fn defaults(&self) -> &TxOptions {
        &self.defaults
    }

    /// Merges `options` into the class defaults, `options` winning.
    pub fn set_defaults(&mut self, options: TxOptions) -> Result<&TxOptions, ContractError> {
        self.ensure_mutable()?;
        self.defaults = options.merged_onto(&self.defaults);
        Ok(&self.defaults)
    }

    pub fn confirmation_policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn set_confirmation_policy(&mut self, policy: ConfirmationPolicy) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        self.policy = policy;
        Ok(())
    }

    pub fn set_synchronization_timeout(&mut self, timeout_ms: u64) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        self.policy.timeout = Duration::from_millis(timeout_ms);
        Ok(())
    }

    pub fn set_extended_results(&mut self, extended: bool) -> Result<(), ContractError> {
        self.ensure_mutable()?;
        self.policy.extended = extended;
        Ok(())
    }

    fn freeze(&self) -> Arc<ContractConfig> {
        self.frozen
            .get_or_init(|| {
                debug!(contract = %self.contract_name(), "configuration frozen");
                Arc::new(ContractConfig {
                    contract_name: self.contract_name().to_string(),
                    network_id: self
                        .network_id
                        .clone()
                        .unwrap_or_else(|| self.loaded_network.clone()),
                    abi: self.network.abi.clone(),
                    methods: MethodTable::from_abi(&self.network.abi),
                    bytecode: self.binary(),
                    address: self.network.address,
                    events: Arc::new(self.network.events.clone()),
                    links: self.network.links.clone(),
                    defaults: self.defaults.clone(),
                    policy: self.policy,
                    updated_at: self.network.updated_at,
                    registry: self.registry.clone(),
                })
            })
            .clone()
    }

    /// An instance at `address`. The address is checked before anything else
    /// and without touching the network.
    pub fn at(&self, address: &str) -> Result<ContractInstance, ContractError> {
        let address = self.parse_address(address)?;
        let transport = self.transport()?;
        Ok(ContractInstance::new(self.freeze(), transport, address))
    }

    /// The instance recorded for the connected network.
    pub async fn deployed(&mut self) -> Result<ContractInstance, ContractError> {
        let transport = self.transport()?;
        self.detect_network().await?;
        let address = self.address().ok_or_else(|| ContractError::NotDeployed {
            contract: self.contract_name().to_string(),
        })?;
        Ok(ContractInstance::new(self.freeze(), transport, address))
    }

    /// Constructor calldata: the linked binary followed by the encoded arguments.
    fn deployment_code(&self, binary: &str, args: &[DynSolValue]) -> Result<Bytes, ContractError> {
        let mut code = hex::decode(binary.trim_start_matches("0x")).map_err(|e| {
            ContractError::Artifact(format!("{} bytecode is not valid hex: {}", self.contract_name(), e))
        })?;

        match self.network.abi.constructor() {
            Some(constructor) => {
                if args.len() != constructor.inputs.len() {
                    return Err(ContractError::abi(
                        "constructor",
                        format!("expected {} arguments, got {}", constructor.inputs.len(), args.len()),
                    ));
                }
                let encoded = constructor
                    .abi_encode_input(args)
                    .map_err(|e| ContractError::abi("constructor", e))?;
                code.extend_from_slice(&encoded);
            }
            None if !args.is_empty() => {
                return Err(ContractError::abi(
                    "constructor",
                    format!("{} takes no constructor arguments", self.contract_name()),
                ));
            }
            None => {}
        }

        Ok(code.into())
    }

    /// Converts JSON constructor arguments against the ABI constructor.
    pub fn constructor_args(&self, args: &[serde_json::Value]) -> Result<Vec<DynSolValue>, ContractError> {
        let inputs = self
            .network
            .abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();
        abi::json_to_dyn_sol_values("constructor", inputs, args)
    }

    /// Deploys a new instance and waits for its receipt.
    pub async fn deploy(
        &mut self,
        args: Vec<DynSolValue>,
        options: TxOptions,
    ) -> Result<ContractInstance, ContractError> {
        let transport = self.transport()?;
        self.detect_network().await?;

        let bytecode = self.network.bytecode.trim();
        if bytecode.is_empty() || bytecode == "0x" {
            return Err(ContractError::MissingBytecode {
                contract: self.contract_name().to_string(),
            });
        }

        let binary = self.binary();
        let unresolved = artifact::unresolved_libraries(&binary);
        if !unresolved.is_empty() {
            return Err(ContractError::UnresolvedLibraries {
                contract: self.contract_name().to_string(),
                libraries: unresolved,
            });
        }

        let options = options.merged_onto(&self.defaults);
        let code = match &options.data {
            Some(data) => data.clone(),
            None => self.deployment_code(&binary, &args)?,
        };

        let config = self.freeze();
        let submitter = TransactionSubmitter::for_deployment(
            transport.clone(),
            config.tracker(transport.clone()),
        );
        let receipt = submitter
            .submit_deployment(&config.contract_name, code, &options)
            .await?
            .await?;

        let address = receipt.contract_address.ok_or_else(|| ContractError::Transport {
            method: "deploy".to_string(),
            message: format!(
                "receipt for {} carries no contract address",
                receipt.transaction_hash
            ),
        })?;
        info!(contract = %config.contract_name, address = %address, "contract deployed");

        Ok(ContractInstance::new(config, transport, address)
            .with_transaction_hash(receipt.transaction_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::mock::{self, MockTransport};
    use alloy::primitives::{B256, U256};
    use serde_json::json;

    fn artifact(bytecode: &str, address: Option<&str>) -> ContractArtifact {
        let mut default = json!({
            "abi": [
                {
                    "type": "constructor",
                    "inputs": [{ "name": "quorum", "type": "uint256" }],
                    "stateMutability": "nonpayable"
                },
                {
                    "type": "function",
                    "name": "owner",
                    "inputs": [],
                    "outputs": [{ "name": "", "type": "address" }],
                    "stateMutability": "view"
                },
                {
                    "type": "event",
                    "name": "ChangeOfRules",
                    "anonymous": false,
                    "inputs": [{ "name": "minimumQuorum", "type": "uint256", "indexed": false }]
                }
            ],
            "bytecode": bytecode,
            "updated_at": 1491130333771u64
        });
        if let Some(address) = address {
            default["address"] = json!(address);
        }
        let json = json!({ "contract_name": "Congress", "networks": { "default": default } });
        ContractArtifact::from_json(&json.to_string()).unwrap()
    }

    fn library(address: Option<&str>) -> ContractFactory {
        let mut network = json!({
            "abi": [
                {
                    "type": "event",
                    "name": "RecordUpdate",
                    "anonymous": false,
                    "inputs": [{ "name": "waste_amt", "type": "uint256", "indexed": false }]
                }
            ],
            "bytecode": "0x6060"
        });
        if let Some(address) = address {
            network["address"] = json!(address);
        }
        let json = json!({ "contract_name": "Lib1", "networks": { "default": network } });
        ContractFactory::from_json(&json.to_string()).unwrap()
    }

    const DEPLOYED: &str = "0xb7fe5d01d33b6405904edde2b58687fae11b664f";

    #[test]
    fn test_at_rejects_bad_address_without_network() {
        let transport = Arc::new(MockTransport::new().with_network_id("1"));
        let mut factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        factory.set_provider(transport.clone()).unwrap();

        for address in ["not-an-address", "0x1234", "b7fe5d01d33b6405904edde2b58687fae11b664f"] {
            assert!(matches!(
                factory.at(address),
                Err(ContractError::InvalidAddress { .. })
            ));
        }
        assert_eq!(transport.total_requests(), 0);
        assert!(!factory.is_frozen());
    }

    #[test]
    fn test_at_without_provider() {
        let factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        assert!(matches!(
            factory.at(DEPLOYED),
            Err(ContractError::ProviderNotSet { .. })
        ));
    }

    #[test]
    fn test_first_instance_freezes_configuration() {
        let mut factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        factory.set_provider(Arc::new(MockTransport::new())).unwrap();
        factory.set_synchronization_timeout(5000).unwrap();

        let instance = factory.at(DEPLOYED).unwrap();
        assert_eq!(instance.config().policy.timeout, Duration::from_millis(5000));

        assert!(matches!(
            factory.link("Lib1", DEPLOYED),
            Err(ContractError::ConfigurationFrozen { .. })
        ));
        assert!(matches!(
            factory.set_network("default"),
            Err(ContractError::ConfigurationFrozen { .. })
        ));
        assert!(matches!(
            factory.set_extended_results(true),
            Err(ContractError::ConfigurationFrozen { .. })
        ));

        // later instances share the snapshot
        let again = factory.at(DEPLOYED).unwrap();
        assert!(Arc::ptr_eq(instance.config(), again.config()));
    }

    #[tokio::test]
    async fn test_deployed_uses_mainnet_aliases() {
        let transport = Arc::new(MockTransport::new().with_network_id("1"));
        let mut factory = ContractFactory::new(artifact("0x6060", Some(DEPLOYED))).unwrap();
        factory.set_provider(transport).unwrap();

        let instance = factory.deployed().await.unwrap();
        assert_eq!(factory.network_id(), Some("default"));
        assert_eq!(format!("{:x}", instance.address()), DEPLOYED.trim_start_matches("0x"));
    }

    #[tokio::test]
    async fn test_deployed_without_address() {
        let transport = Arc::new(MockTransport::new().with_network_id("1"));
        let mut factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        factory.set_provider(transport).unwrap();

        assert!(matches!(
            factory.deployed().await,
            Err(ContractError::NotDeployed { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let transport = Arc::new(MockTransport::new().with_network_id("5777"));
        let mut factory = ContractFactory::new(artifact("0x6060", Some(DEPLOYED))).unwrap();
        factory.set_provider(transport).unwrap();

        match factory.deployed().await {
            Err(ContractError::UnknownNetwork { network_id, .. }) => assert_eq!(network_id, "5777"),
            other => panic!("expected unknown network, got {:?}", other.map(|i| i.address())),
        }
    }

    #[test]
    fn test_set_network_rejects_unknown_id() {
        let mut factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        assert_eq!(factory.networks(), vec!["default"]);
        assert!(matches!(
            factory.set_network("42"),
            Err(ContractError::UnknownNetwork { .. })
        ));
        assert!(factory.with_network("default").is_ok());
    }

    #[tokio::test]
    async fn test_deploy_reports_unresolved_libraries() {
        let transport = Arc::new(MockTransport::new().with_network_id("1"));
        let bytecode = "0x6060__Lib2___6000__Lib1___6001__Lib1___";
        let mut factory = ContractFactory::new(artifact(bytecode, None)).unwrap();
        factory.set_provider(transport.clone()).unwrap();

        let err = factory
            .deploy(vec![DynSolValue::Uint(U256::from(1), 256)], TxOptions::default())
            .await
            .unwrap_err();
        match &err {
            ContractError::UnresolvedLibraries { libraries, .. } => {
                assert_eq!(libraries, &vec!["Lib1".to_string(), "Lib2".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().ends_with(": Lib1, Lib2"));
        assert!(transport.requests().is_empty());
        assert_eq!(transport.receipt_polls(), 0);
    }

    #[tokio::test]
    async fn test_deploy_without_bytecode() {
        let mut factory = ContractFactory::new(artifact("0x", None)).unwrap();
        factory
            .set_provider(Arc::new(MockTransport::new().with_network_id("1")))
            .unwrap();
        assert!(matches!(
            factory.deploy(vec![], TxOptions::default()).await,
            Err(ContractError::MissingBytecode { .. })
        ));
    }

    #[test]
    fn test_link_library_merges_events() {
        let mut factory = ContractFactory::new(artifact("0x60__Lib1___00", None)).unwrap();
        assert!(matches!(
            factory.link_library(&library(None)),
            Err(ContractError::NotDeployed { .. })
        ));

        let lib = library(Some("0x1111111111111111111111111111111111111111"));
        factory.link_library(&lib).unwrap();

        assert_eq!(factory.events().len(), 2);
        assert_eq!(factory.binary(), format!("0x60{}00", "11".repeat(20)));
        assert!(artifact::unresolved_libraries(&factory.binary()).is_empty());
    }

    #[test]
    fn test_defaults_merge() {
        let mut factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        factory
            .set_defaults(TxOptions::new().from(Address::repeat_byte(1)).gas(100))
            .unwrap();
        let merged = factory.set_defaults(TxOptions::new().gas(200)).unwrap();
        assert_eq!(merged.from, Some(Address::repeat_byte(1)));
        assert_eq!(merged.gas, Some(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_waits_for_receipt() {
        let tx_hash = B256::repeat_byte(0xd0);
        let created = Address::repeat_byte(0xcc);
        let transport = Arc::new(
            MockTransport::new()
                .with_network_id("1")
                .with_send_result(tx_hash)
                .with_receipt_on_attempt(3, mock::deployment_receipt(tx_hash, created)),
        );
        let mut factory = ContractFactory::new(artifact("0x6060", None)).unwrap();
        factory.set_provider(transport.clone()).unwrap();
        factory
            .set_defaults(TxOptions::new().from(Address::repeat_byte(9)).gas(4_000_000))
            .unwrap();

        let instance = factory
            .deploy(vec![DynSolValue::Uint(U256::from(2), 256)], TxOptions::default())
            .await
            .unwrap();
        assert_eq!(instance.address(), created);
        assert_eq!(instance.transaction_hash(), Some(tx_hash));
        assert_eq!(transport.receipt_polls(), 3);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].from, Some(Address::repeat_byte(9)));
        assert_eq!(requests[0].gas, Some(4_000_000));
        let input = requests[0].input.input().cloned().unwrap_or_default();
        assert_eq!(&input[..2], &[0x60, 0x60]);
        assert_eq!(input.len(), 2 + 32);
        assert!(factory.is_frozen());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_uses_detected_network_binary() {
        // default record still needs a library; the mainnet record is fully linked
        let mut two_networks = artifact("0x60__Lib1___00", None);
        let mut mainnet = two_networks.networks[DEFAULT_NETWORK].clone();
        mainnet.bytecode = "0x7070".to_string();
        two_networks.networks.insert("1".to_string(), mainnet);

        let tx_hash = B256::repeat_byte(0xd1);
        let created = Address::repeat_byte(0xcd);
        let transport = Arc::new(
            MockTransport::new()
                .with_network_id("1")
                .with_send_result(tx_hash)
                .with_receipt_on_attempt(1, mock::deployment_receipt(tx_hash, created)),
        );
        let mut factory = ContractFactory::new(two_networks).unwrap();
        factory.set_provider(transport.clone()).unwrap();

        let instance = factory
            .deploy(vec![DynSolValue::Uint(U256::from(3), 256)], TxOptions::default())
            .await
            .unwrap();
        assert_eq!(factory.network_id(), Some("1"));
        assert_eq!(instance.config().network_id, "1");
        assert_eq!(instance.config().bytecode, "0x7070");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let input = requests[0].input.input().cloned().unwrap_or_default();
        assert_eq!(&input[..2], &[0x70, 0x70]);
        assert_eq!(input.len(), 2 + 32);
    }

    #[test]
    fn test_set_network_keeps_only_user_links() {
        let static_lib = Address::repeat_byte(0x22);
        let mut two_networks = artifact("0x6060", None);
        let mut mainnet = two_networks.networks[DEFAULT_NETWORK].clone();
        two_networks
            .networks
            .get_mut(DEFAULT_NETWORK)
            .unwrap()
            .links
            .insert("Static".to_string(), static_lib);
        mainnet.events = EventTopicTable::default();
        two_networks.networks.insert("1".to_string(), mainnet);

        let mut factory = ContractFactory::new(two_networks).unwrap();
        assert_eq!(factory.links().get("Static"), Some(&static_lib));

        factory
            .link("Lib2", "0x3333333333333333333333333333333333333333")
            .unwrap();
        factory
            .link_library(&library(Some("0x1111111111111111111111111111111111111111")))
            .unwrap();

        factory.set_network("1").unwrap();
        let names: Vec<&str> = factory.links().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Lib1", "Lib2"]);
        // the library's events come along, the record's own table is empty
        assert_eq!(factory.events().len(), 1);

        factory.set_network(DEFAULT_NETWORK).unwrap();
        assert_eq!(factory.links().len(), 3);
        assert_eq!(factory.events().len(), 2);
    }
}

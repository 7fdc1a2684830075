use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Log, B256},
};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{
    abi::{self, CallSpec},
    confirmation::PendingConfirmation,
    events::EventDecoder,
    factory::ContractConfig,
    invoker::{ReadInvoker, TransactionSubmitter},
    params::{self, TxOptions},
    provider::Transport,
    utils, ContractError, DecodedEvent, TxOutcome,
};

/// Which way to run a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallVariant {
    /// Read for constant functions, submit and confirm otherwise.
    Default,
    /// Read, even for state-changing functions.
    Call,
    /// Submit and return the hash without waiting.
    SendTransaction,
    EstimateGas,
}

impl FromStr for CallVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" | "execute" => Ok(CallVariant::Default),
            "call" => Ok(CallVariant::Call),
            "send" | "sendTransaction" | "send_transaction" => Ok(CallVariant::SendTransaction),
            "estimate" | "estimateGas" | "estimate_gas" => Ok(CallVariant::EstimateGas),
            other => Err(anyhow::anyhow!("Unknown call variant '{}'", other)),
        }
    }
}

impl fmt::Display for CallVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallVariant::Default => "execute",
            CallVariant::Call => "call",
            CallVariant::SendTransaction => "send",
            CallVariant::EstimateGas => "estimate",
        })
    }
}

/// Result of a default invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Returned(Vec<DynSolValue>),
    Transacted(TxOutcome),
}

/// A contract at a known address, bound to a frozen configuration.
#[derive(Clone)]
pub struct ContractInstance {
    config: Arc<ContractConfig>,
    address: Address,
    transaction_hash: Option<B256>,
    reader: ReadInvoker,
    submitter: TransactionSubmitter,
}

impl ContractInstance {
    pub(crate) fn new(
        config: Arc<ContractConfig>,
        transport: Arc<dyn Transport>,
        address: Address,
    ) -> Self {
        let tracker = config.tracker(transport.clone()).for_address(address);
        Self {
            reader: ReadInvoker::new(transport.clone(), address),
            submitter: TransactionSubmitter::new(transport, tracker, address),
            config,
            address,
            transaction_hash: None,
        }
    }

    pub(crate) fn with_transaction_hash(mut self, tx_hash: B256) -> Self {
        self.transaction_hash = Some(tx_hash);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Hash of the creation transaction, for instances this process deployed.
    pub fn transaction_hash(&self) -> Option<B256> {
        self.transaction_hash
    }

    pub fn config(&self) -> &Arc<ContractConfig> {
        &self.config
    }

    pub fn contract_name(&self) -> &str {
        &self.config.contract_name
    }

    pub fn method(&self, name: &str) -> Result<CallSpec, ContractError> {
        self.config.methods.resolve(&self.config.contract_name, name)
    }

    fn options(&self, options: &TxOptions) -> TxOptions {
        options.merged_onto(&self.config.defaults)
    }

    pub async fn call(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<Vec<DynSolValue>, ContractError> {
        self.reader
            .invoke_read(spec, args, &self.options(options))
            .await
    }

    pub async fn send_transaction(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<B256, ContractError> {
        self.submitter
            .send(spec, args, &self.options(options))
            .await
    }

    pub async fn submit(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<PendingConfirmation<TxOutcome>, ContractError> {
        self.submitter
            .submit(spec, args, &self.options(options))
            .await
    }

    /// Submits and waits for confirmation.
    pub async fn execute(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        self.submit(spec, args, options).await?.await
    }

    pub async fn estimate_gas(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<u64, ContractError> {
        self.reader
            .estimate_gas(spec, args, &self.options(options))
            .await
    }

    pub async fn invoke(
        &self,
        spec: &CallSpec,
        args: &[DynSolValue],
        options: &TxOptions,
    ) -> Result<Invocation, ContractError> {
        if spec.is_constant() {
            self.call(spec, args, options).await.map(Invocation::Returned)
        } else {
            self.execute(spec, args, options)
                .await
                .map(Invocation::Transacted)
        }
    }

    /// Runs `method` with JSON arguments. A trailing plain object is taken as
    /// call options.
    pub async fn invoke_json(
        &self,
        method: &str,
        variant: CallVariant,
        args: Vec<Value>,
    ) -> Result<Value, ContractError> {
        utils::validate_function_name(method).map_err(|e| ContractError::abi(method, e))?;
        let spec = self.method(method)?;
        let (args, options) = params::split_options(args, &TxOptions::default())
            .map_err(|e| ContractError::abi(method, e))?;
        let args = spec.json_args(&args)?;

        match variant {
            CallVariant::Default => match self.invoke(&spec, &args, &options).await? {
                Invocation::Returned(values) => Ok(abi::dyn_sol_values_to_json(&values)),
                Invocation::Transacted(outcome) => Ok(outcome.to_json()),
            },
            CallVariant::Call => {
                let values = self.call(&spec, &args, &options).await?;
                Ok(abi::dyn_sol_values_to_json(&values))
            }
            CallVariant::SendTransaction => {
                let tx_hash = self.send_transaction(&spec, &args, &options).await?;
                Ok(Value::String(format!("0x{:x}", tx_hash)))
            }
            CallVariant::EstimateGas => {
                let gas = self.estimate_gas(&spec, &args, &options).await?;
                Ok(Value::from(gas))
            }
        }
    }

    /// Polls again for a transaction whose confirmation timed out.
    pub fn confirm(&self, tx_hash: B256) -> Result<PendingConfirmation<TxOutcome>, ContractError> {
        self.submitter.confirm(tx_hash)
    }

    pub fn decode_logs(&self, logs: &[Log]) -> Vec<DecodedEvent> {
        EventDecoder::new(&self.config.events, self.address).decode(logs)
    }
}

impl fmt::Debug for ContractInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractInstance")
            .field("contract", &self.config.contract_name)
            .field("network", &self.config.network_id)
            .field("address", &self.address)
            .field("transaction_hash", &self.transaction_hash)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::{
        factory::ContractFactory,
        mock::{self, MockTransport},
    };
    use alloy::primitives::U256;
    use serde_json::json;
    use std::time::Duration;

    const ADDRESS: &str = "0xb7fe5d01d33b6405904edde2b58687fae11b664f";

    fn factory(transport: Arc<MockTransport>) -> ContractFactory {
        let artifact = json!({
            "contract_name": "Congress",
            "networks": {
                "default": {
                    "abi": [
                        {
                            "type": "function",
                            "name": "minimumQuorum",
                            "inputs": [],
                            "outputs": [{ "name": "", "type": "uint256" }],
                            "stateMutability": "view"
                        },
                        {
                            "type": "function",
                            "name": "addMember",
                            "inputs": [
                                { "name": "targetMember", "type": "address" },
                                { "name": "memberName", "type": "string" }
                            ],
                            "outputs": [],
                            "stateMutability": "nonpayable"
                        }
                    ],
                    "bytecode": "0x6060"
                }
            }
        });
        let mut factory = ContractFactory::from_json(&artifact.to_string()).unwrap();
        factory.set_provider(transport).unwrap();
        factory
            .set_defaults(TxOptions::new().from(Address::repeat_byte(0xaa)).gas(300_000))
            .unwrap();
        factory
    }

    #[test]
    fn test_call_variant_parsing() {
        assert_eq!("call".parse::<CallVariant>().unwrap(), CallVariant::Call);
        assert_eq!("execute".parse::<CallVariant>().unwrap(), CallVariant::Default);
        assert_eq!(
            "estimateGas".parse::<CallVariant>().unwrap(),
            CallVariant::EstimateGas
        );
        assert!("delegatecall".parse::<CallVariant>().is_err());
    }

    #[tokio::test]
    async fn test_default_variant_reads_constant_functions() {
        let encoded = DynSolValue::Uint(U256::from(4), 256).abi_encode();
        let transport = Arc::new(MockTransport::new().with_call_result(encoded));
        let instance = factory(transport.clone()).at(ADDRESS).unwrap();

        let result = instance
            .invoke_json("minimumQuorum", CallVariant::Default, vec![])
            .await
            .unwrap();
        assert_eq!(result, json!("4"));
        assert_eq!(transport.receipt_polls(), 0);
        assert_eq!(transport.requests()[0].from, Some(Address::repeat_byte(0xaa)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_variant_confirms_writes() {
        let tx_hash = B256::repeat_byte(0x31);
        let transport = Arc::new(
            MockTransport::new()
                .with_send_result(tx_hash)
                .with_receipt_on_attempt(2, mock::receipt(tx_hash)),
        );
        let instance = factory(transport.clone()).at(ADDRESS).unwrap();

        let result = instance
            .invoke_json(
                "addMember",
                CallVariant::Default,
                vec![
                    json!("0x1111111111111111111111111111111111111111"),
                    json!("alice"),
                    json!({ "gas": 120000 }),
                ],
            )
            .await
            .unwrap();
        assert_eq!(result, json!(format!("0x{:x}", tx_hash)));
        assert_eq!(transport.receipt_polls(), 2);

        let request = &transport.requests()[0];
        // call-site gas wins, default sender kept
        assert_eq!(request.gas, Some(120_000));
        assert_eq!(request.from, Some(Address::repeat_byte(0xaa)));
    }

    #[tokio::test]
    async fn test_send_transaction_does_not_wait() {
        let tx_hash = B256::repeat_byte(0x32);
        let transport = Arc::new(MockTransport::new().with_send_result(tx_hash));
        let instance = factory(transport.clone()).at(ADDRESS).unwrap();

        let result = instance
            .invoke_json(
                "addMember",
                CallVariant::SendTransaction,
                vec![json!("0x1111111111111111111111111111111111111111"), json!("bob")],
            )
            .await
            .unwrap();
        assert_eq!(result, json!(format!("0x{:x}", tx_hash)));
        assert_eq!(transport.receipt_polls(), 0);
    }

    #[tokio::test]
    async fn test_call_variant_reads_write_functions() {
        let transport = Arc::new(MockTransport::new());
        let instance = factory(transport.clone()).at(ADDRESS).unwrap();

        let result = instance
            .invoke_json(
                "addMember",
                CallVariant::Call,
                vec![json!("0x1111111111111111111111111111111111111111"), json!("bob")],
            )
            .await
            .unwrap();
        assert_eq!(result, json!([]));
        assert_eq!(transport.total_requests(), 1);
    }

    #[tokio::test]
    async fn test_estimate_gas() {
        let transport = Arc::new(MockTransport::new().with_gas_estimate(54_321));
        let instance = factory(transport).at(ADDRESS).unwrap();
        let result = instance
            .invoke_json("minimumQuorum", CallVariant::EstimateGas, vec![])
            .await
            .unwrap();
        assert_eq!(result, json!(54_321));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let instance = factory(Arc::new(MockTransport::new())).at(ADDRESS).unwrap();
        assert!(matches!(
            instance.invoke_json("selfDestruct", CallVariant::Call, vec![]).await,
            Err(ContractError::UnknownMethod { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_confirm_after_timeout() {
        let tx_hash = B256::repeat_byte(0x33);
        let transport = Arc::new(MockTransport::new().with_send_result(tx_hash));
        let mut factory = factory(transport.clone());
        factory.set_synchronization_timeout(2000).unwrap();
        let instance = factory.at(ADDRESS).unwrap();
        let spec = instance.method("addMember").unwrap();
        let args = [
            DynSolValue::Address(Address::repeat_byte(1)),
            DynSolValue::String("carol".to_string()),
        ];

        let err = instance
            .execute(&spec, &args, &TxOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
        let polls = transport.receipt_polls();

        let pending = instance.confirm(tx_hash).unwrap();
        assert!(matches!(
            instance.confirm(tx_hash),
            Err(ContractError::AlreadyPending { .. })
        ));
        assert!(matches!(pending.await, Err(ContractError::Timeout { .. })));
        assert!(transport.receipt_polls() > polls);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(instance.confirm(tx_hash).is_ok());
    }
}

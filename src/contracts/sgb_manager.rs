use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};

use super::{uint, KnownContract, SgbRecord, WasteRecord};
use crate::ethereum::{
    abi::{CallSpec, OutputReader},
    contract::ContractInstance,
    factory::ContractFactory,
    params::TxOptions,
    ContractError, TxOutcome,
};

/// The bin and waste-record functions. ComDAO carries the same set.
#[derive(Debug, Clone)]
pub struct SgbMethods {
    sgb_collection: CallSpec,
    record_collection: CallSpec,
    add_sgb: CallSpec,
    calculate_price: CallSpec,
    add_record: CallSpec,
}

impl SgbMethods {
    pub fn resolve(instance: &ContractInstance) -> Result<Self, ContractError> {
        Ok(Self {
            sgb_collection: instance.method("sgbCollection")?,
            record_collection: instance.method("recordCollection")?,
            add_sgb: instance.method("addSGB")?,
            calculate_price: instance.method("calculatePrice")?,
            add_record: instance.method("addRecord")?,
        })
    }

    pub async fn sgb_collection(
        &self,
        instance: &ContractInstance,
        index: U256,
    ) -> Result<SgbRecord, ContractError> {
        let values = instance
            .call(&self.sgb_collection, &[uint(index)], &TxOptions::default())
            .await?;
        SgbRecord::from_outputs(self.sgb_collection.name(), &values)
    }

    pub async fn record_collection(
        &self,
        instance: &ContractInstance,
        index: U256,
    ) -> Result<WasteRecord, ContractError> {
        let values = instance
            .call(&self.record_collection, &[uint(index)], &TxOptions::default())
            .await?;
        WasteRecord::from_outputs(self.record_collection.name(), &values)
    }

    fn add_sgb_args(
        latitude: &str,
        longitude: &str,
        rate: U256,
        max: U256,
        current: U256,
        owner: Address,
    ) -> Vec<DynSolValue> {
        vec![
            DynSolValue::String(latitude.to_string()),
            DynSolValue::String(longitude.to_string()),
            uint(rate),
            uint(max),
            uint(current),
            DynSolValue::Address(owner),
        ]
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_sgb(
        &self,
        instance: &ContractInstance,
        latitude: &str,
        longitude: &str,
        rate: U256,
        max: U256,
        current: U256,
        owner: Address,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = Self::add_sgb_args(latitude, longitude, rate, max, current, owner);
        instance.execute(&self.add_sgb, &args, options).await
    }

    /// Simulates `addSGB` and returns the id it would assign.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_sgb_call(
        &self,
        instance: &ContractInstance,
        latitude: &str,
        longitude: &str,
        rate: U256,
        max: U256,
        current: U256,
        owner: Address,
        options: &TxOptions,
    ) -> Result<U256, ContractError> {
        let args = Self::add_sgb_args(latitude, longitude, rate, max, current, owner);
        let values = instance.call(&self.add_sgb, &args, options).await?;
        OutputReader::new(self.add_sgb.name(), &values).uint()
    }

    pub async fn calculate_price(
        &self,
        instance: &ContractInstance,
        weight: U256,
        sgb_id: U256,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        instance
            .execute(&self.calculate_price, &[uint(weight), uint(sgb_id)], options)
            .await
    }

    pub async fn calculate_price_call(
        &self,
        instance: &ContractInstance,
        weight: U256,
        sgb_id: U256,
    ) -> Result<U256, ContractError> {
        let values = instance
            .call(
                &self.calculate_price,
                &[uint(weight), uint(sgb_id)],
                &TxOptions::default(),
            )
            .await?;
        OutputReader::new(self.calculate_price.name(), &values).uint()
    }

    fn add_record_args(user: Address, sgb_id: U256, waste: U256, message: &str) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(user),
            uint(sgb_id),
            uint(waste),
            DynSolValue::String(message.to_string()),
        ]
    }

    pub async fn add_record(
        &self,
        instance: &ContractInstance,
        user: Address,
        sgb_id: U256,
        waste: U256,
        message: &str,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = Self::add_record_args(user, sgb_id, waste, message);
        instance.execute(&self.add_record, &args, options).await
    }

    /// Simulates `addRecord` and returns the price it would charge.
    pub async fn add_record_call(
        &self,
        instance: &ContractInstance,
        user: Address,
        sgb_id: U256,
        waste: U256,
        message: &str,
        options: &TxOptions,
    ) -> Result<U256, ContractError> {
        let args = Self::add_record_args(user, sgb_id, waste, message);
        let values = instance.call(&self.add_record, &args, options).await?;
        OutputReader::new(self.add_record.name(), &values).uint()
    }
}

/// Typed binding for the SGBManager contract.
#[derive(Debug, Clone)]
pub struct SgbManager {
    instance: ContractInstance,
    sgb: SgbMethods,
}

impl SgbManager {
    pub fn factory() -> Result<ContractFactory, ContractError> {
        KnownContract::SgbManager.factory()
    }

    pub fn new(instance: ContractInstance) -> Result<Self, ContractError> {
        let sgb = SgbMethods::resolve(&instance)?;
        Ok(Self { instance, sgb })
    }

    pub fn at(factory: &ContractFactory, address: &str) -> Result<Self, ContractError> {
        Self::new(factory.at(address)?)
    }

    pub async fn deployed(factory: &mut ContractFactory) -> Result<Self, ContractError> {
        Self::new(factory.deployed().await?)
    }

    pub async fn deploy(
        factory: &mut ContractFactory,
        options: TxOptions,
    ) -> Result<Self, ContractError> {
        Self::new(factory.deploy(Vec::new(), options).await?)
    }

    pub fn instance(&self) -> &ContractInstance {
        &self.instance
    }

    pub fn address(&self) -> Address {
        self.instance.address()
    }

    pub async fn sgb_collection(&self, index: U256) -> Result<SgbRecord, ContractError> {
        self.sgb.sgb_collection(&self.instance, index).await
    }

    pub async fn record_collection(&self, index: U256) -> Result<WasteRecord, ContractError> {
        self.sgb.record_collection(&self.instance, index).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_sgb(
        &self,
        latitude: &str,
        longitude: &str,
        rate: U256,
        max: U256,
        current: U256,
        owner: Address,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        self.sgb
            .add_sgb(&self.instance, latitude, longitude, rate, max, current, owner, options)
            .await
    }

    pub async fn calculate_price(
        &self,
        weight: U256,
        sgb_id: U256,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        self.sgb
            .calculate_price(&self.instance, weight, sgb_id, options)
            .await
    }

    pub async fn calculate_price_call(&self, weight: U256, sgb_id: U256) -> Result<U256, ContractError> {
        self.sgb
            .calculate_price_call(&self.instance, weight, sgb_id)
            .await
    }

    pub async fn add_record(
        &self,
        user: Address,
        sgb_id: U256,
        waste: U256,
        message: &str,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        self.sgb
            .add_record(&self.instance, user, sgb_id, waste, message, options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::mock::MockTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_deployed_without_address() {
        let transport = Arc::new(MockTransport::new().with_network_id("1"));
        let mut factory = SgbManager::factory().unwrap();
        factory.set_provider(transport).unwrap();

        assert!(matches!(
            SgbManager::deployed(&mut factory).await,
            Err(ContractError::NotDeployed { .. })
        ));
    }

    #[tokio::test]
    async fn test_sgb_collection_decodes_record() {
        let owner = Address::repeat_byte(0x0b);
        let encoded = DynSolValue::Tuple(vec![
            uint(U256::from(1)),
            DynSolValue::String("53.3498".to_string()),
            DynSolValue::String("-6.2603".to_string()),
            uint(U256::from(15)),
            uint(U256::from(500)),
            uint(U256::from(120)),
            DynSolValue::Address(owner),
        ])
        .abi_encode_params();
        let transport = Arc::new(MockTransport::new().with_call_result(encoded));
        let mut factory = SgbManager::factory().unwrap();
        factory.set_provider(transport).unwrap();

        let manager =
            SgbManager::at(&factory, "0x3333333333333333333333333333333333333333").unwrap();
        let record = manager.sgb_collection(U256::from(0)).await.unwrap();
        assert_eq!(record.sgb_id, U256::from(1));
        assert_eq!(record.lon, "-6.2603");
        assert_eq!(record.max_capacity, U256::from(500));
        assert_eq!(record.owner_account, owner);
    }

    #[tokio::test]
    async fn test_calculate_price_call() {
        let transport = Arc::new(
            MockTransport::new().with_call_result(uint(U256::from(750)).abi_encode()),
        );
        let mut factory = SgbManager::factory().unwrap();
        factory.set_provider(transport.clone()).unwrap();
        let manager =
            SgbManager::at(&factory, "0x3333333333333333333333333333333333333333").unwrap();

        let price = manager
            .calculate_price_call(U256::from(50), U256::from(1))
            .await
            .unwrap();
        assert_eq!(price, U256::from(750));
        assert_eq!(transport.receipt_polls(), 0);
    }
}

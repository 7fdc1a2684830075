use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, I256, U256},
};

use super::{int, uint, KnownContract, Member, Proposal, SgbMethods, SgbRecord, WasteRecord};
use crate::ethereum::{
    abi::{CallSpec, OutputReader},
    contract::ContractInstance,
    factory::ContractFactory,
    params::TxOptions,
    ContractError, TxOutcome,
};

/// Typed binding for the ComDAO governance contract.
///
/// Every function is resolved against the ABI once, in [`ComDao::new`]. Reads
/// use the factory defaults; writes take call-site options and wait for
/// confirmation.
#[derive(Debug, Clone)]
pub struct ComDao {
    instance: ContractInstance,
    sgb: SgbMethods,
    proposals: CallSpec,
    remove_member: CallSpec,
    execute_proposal: CallSpec,
    member_id: CallSpec,
    num_proposals: CallSpec,
    members: CallSpec,
    debating_period_in_minutes: CallSpec,
    minimum_quorum: CallSpec,
    owner: CallSpec,
    receive_approval: CallSpec,
    majority_margin: CallSpec,
    new_proposal: CallSpec,
    change_voting_rules: CallSpec,
    add_member: CallSpec,
    vote: CallSpec,
    check_proposal_code: CallSpec,
    transfer_ownership: CallSpec,
}

impl ComDao {
    pub fn factory() -> Result<ContractFactory, ContractError> {
        KnownContract::ComDao.factory()
    }

    pub fn new(instance: ContractInstance) -> Result<Self, ContractError> {
        Ok(Self {
            sgb: SgbMethods::resolve(&instance)?,
            proposals: instance.method("proposals")?,
            remove_member: instance.method("removeMember")?,
            execute_proposal: instance.method("executeProposal")?,
            member_id: instance.method("memberId")?,
            num_proposals: instance.method("numProposals")?,
            members: instance.method("members")?,
            debating_period_in_minutes: instance.method("debatingPeriodInMinutes")?,
            minimum_quorum: instance.method("minimumQuorum")?,
            owner: instance.method("owner")?,
            receive_approval: instance.method("receiveApproval")?,
            majority_margin: instance.method("majorityMargin")?,
            new_proposal: instance.method("newProposal")?,
            change_voting_rules: instance.method("changeVotingRules")?,
            add_member: instance.method("addMember")?,
            vote: instance.method("vote")?,
            check_proposal_code: instance.method("checkProposalCode")?,
            transfer_ownership: instance.method("transferOwnership")?,
            instance,
        })
    }

    pub fn at(factory: &ContractFactory, address: &str) -> Result<Self, ContractError> {
        Self::new(factory.at(address)?)
    }

    pub async fn deployed(factory: &mut ContractFactory) -> Result<Self, ContractError> {
        Self::new(factory.deployed().await?)
    }

    pub async fn deploy(
        factory: &mut ContractFactory,
        minimum_quorum_for_proposals: U256,
        minutes_for_debate: U256,
        margin_of_votes_for_majority: I256,
        congress_leader: Address,
        options: TxOptions,
    ) -> Result<Self, ContractError> {
        let args = vec![
            uint(minimum_quorum_for_proposals),
            uint(minutes_for_debate),
            int(margin_of_votes_for_majority),
            DynSolValue::Address(congress_leader),
        ];
        Self::new(factory.deploy(args, options).await?)
    }

    pub fn instance(&self) -> &ContractInstance {
        &self.instance
    }

    pub fn address(&self) -> Address {
        self.instance.address()
    }

    async fn read(&self, spec: &CallSpec, args: &[DynSolValue]) -> Result<Vec<DynSolValue>, ContractError> {
        self.instance.call(spec, args, &TxOptions::default()).await
    }

    async fn read_uint(&self, spec: &CallSpec, args: &[DynSolValue]) -> Result<U256, ContractError> {
        let values = self.read(spec, args).await?;
        OutputReader::new(spec.name(), &values).uint()
    }

    pub async fn proposals(&self, index: U256) -> Result<Proposal, ContractError> {
        let values = self.read(&self.proposals, &[uint(index)]).await?;
        Proposal::from_outputs(self.proposals.name(), &values)
    }

    pub async fn members(&self, index: U256) -> Result<Member, ContractError> {
        let values = self.read(&self.members, &[uint(index)]).await?;
        Member::from_outputs(self.members.name(), &values)
    }

    pub async fn member_id(&self, member: Address) -> Result<U256, ContractError> {
        self.read_uint(&self.member_id, &[DynSolValue::Address(member)])
            .await
    }

    pub async fn num_proposals(&self) -> Result<U256, ContractError> {
        self.read_uint(&self.num_proposals, &[]).await
    }

    pub async fn debating_period_in_minutes(&self) -> Result<U256, ContractError> {
        self.read_uint(&self.debating_period_in_minutes, &[]).await
    }

    pub async fn minimum_quorum(&self) -> Result<U256, ContractError> {
        self.read_uint(&self.minimum_quorum, &[]).await
    }

    pub async fn owner(&self) -> Result<Address, ContractError> {
        let values = self.read(&self.owner, &[]).await?;
        OutputReader::new(self.owner.name(), &values).address()
    }

    pub async fn majority_margin(&self) -> Result<I256, ContractError> {
        let values = self.read(&self.majority_margin, &[]).await?;
        OutputReader::new(self.majority_margin.name(), &values).int()
    }

    pub async fn check_proposal_code(
        &self,
        proposal_number: U256,
        beneficiary: Address,
        ether_amount: U256,
        transaction_bytecode: Bytes,
    ) -> Result<bool, ContractError> {
        let args = [
            uint(proposal_number),
            DynSolValue::Address(beneficiary),
            uint(ether_amount),
            DynSolValue::Bytes(transaction_bytecode.to_vec()),
        ];
        let values = self.read(&self.check_proposal_code, &args).await?;
        OutputReader::new(self.check_proposal_code.name(), &values).bool()
    }

    pub async fn add_member(
        &self,
        target_member: Address,
        member_name: &str,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = [
            DynSolValue::Address(target_member),
            DynSolValue::String(member_name.to_string()),
        ];
        self.instance.execute(&self.add_member, &args, options).await
    }

    pub async fn remove_member(
        &self,
        target_member: Address,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        self.instance
            .execute(&self.remove_member, &[DynSolValue::Address(target_member)], options)
            .await
    }

    pub async fn change_voting_rules(
        &self,
        minimum_quorum_for_proposals: U256,
        minutes_for_debate: U256,
        margin_of_votes_for_majority: I256,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = [
            uint(minimum_quorum_for_proposals),
            uint(minutes_for_debate),
            int(margin_of_votes_for_majority),
        ];
        self.instance
            .execute(&self.change_voting_rules, &args, options)
            .await
    }

    fn new_proposal_args(
        beneficiary: Address,
        ether_amount: U256,
        job_description: &str,
        transaction_bytecode: &Bytes,
    ) -> [DynSolValue; 4] {
        [
            DynSolValue::Address(beneficiary),
            uint(ether_amount),
            DynSolValue::String(job_description.to_string()),
            DynSolValue::Bytes(transaction_bytecode.to_vec()),
        ]
    }

    pub async fn new_proposal(
        &self,
        beneficiary: Address,
        ether_amount: U256,
        job_description: &str,
        transaction_bytecode: &Bytes,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args =
            Self::new_proposal_args(beneficiary, ether_amount, job_description, transaction_bytecode);
        self.instance.execute(&self.new_proposal, &args, options).await
    }

    /// Simulates `newProposal` and returns the id it would assign.
    pub async fn new_proposal_call(
        &self,
        beneficiary: Address,
        ether_amount: U256,
        job_description: &str,
        transaction_bytecode: &Bytes,
        options: &TxOptions,
    ) -> Result<U256, ContractError> {
        let args =
            Self::new_proposal_args(beneficiary, ether_amount, job_description, transaction_bytecode);
        let values = self.instance.call(&self.new_proposal, &args, options).await?;
        OutputReader::new(self.new_proposal.name(), &values).uint()
    }

    pub async fn vote(
        &self,
        proposal_number: U256,
        supports_proposal: bool,
        justification_text: &str,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = [
            uint(proposal_number),
            DynSolValue::Bool(supports_proposal),
            DynSolValue::String(justification_text.to_string()),
        ];
        self.instance.execute(&self.vote, &args, options).await
    }

    pub async fn execute_proposal(
        &self,
        proposal_number: U256,
        transaction_bytecode: &Bytes,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = [
            uint(proposal_number),
            DynSolValue::Bytes(transaction_bytecode.to_vec()),
        ];
        self.instance
            .execute(&self.execute_proposal, &args, options)
            .await
    }

    pub async fn receive_approval(
        &self,
        from: Address,
        value: U256,
        token: Address,
        extra_data: &Bytes,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        let args = [
            DynSolValue::Address(from),
            uint(value),
            DynSolValue::Address(token),
            DynSolValue::Bytes(extra_data.to_vec()),
        ];
        self.instance
            .execute(&self.receive_approval, &args, options)
            .await
    }

    pub async fn transfer_ownership(
        &self,
        new_owner: Address,
        options: &TxOptions,
    ) -> Result<TxOutcome, ContractError> {
        self.instance
            .execute(&self.transfer_ownership, &[DynSolValue::Address(new_owner)], options)
            .await
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

    /// Simulates `addRecord` and returns the price it would charge.
    pub async fn add_record_call(
        &self,
        user: Address,
        sgb_id: U256,
        waste: U256,
        message: &str,
        options: &TxOptions,
    ) -> Result<U256, ContractError> {
        self.sgb
            .add_record_call(&self.instance, user, sgb_id, waste, message, options)
            .await
    }
}

//! Typed bindings for the bundled contracts.

pub mod com_dao;
pub mod sgb_manager;

pub use com_dao::ComDao;
pub use sgb_manager::{SgbManager, SgbMethods};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, B256, I256, U256},
};
use anyhow::anyhow;
use std::fmt;
use std::str::FromStr;

use crate::ethereum::{
    abi::OutputReader, artifact::ContractArtifact, factory::ContractFactory, ContractError,
};

pub const COM_DAO_ARTIFACT: &str = include_str!("artifacts/ComDAO.json");
pub const SGB_MANAGER_ARTIFACT: &str = include_str!("artifacts/SGBManager.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownContract {
    ComDao,
    SgbManager,
}

impl KnownContract {
    pub const ALL: [KnownContract; 2] = [KnownContract::ComDao, KnownContract::SgbManager];

    pub fn name(&self) -> &'static str {
        match self {
            KnownContract::ComDao => "ComDAO",
            KnownContract::SgbManager => "SGBManager",
        }
    }

    pub fn artifact_json(&self) -> &'static str {
        match self {
            KnownContract::ComDao => COM_DAO_ARTIFACT,
            KnownContract::SgbManager => SGB_MANAGER_ARTIFACT,
        }
    }

    pub fn artifact(&self) -> Result<ContractArtifact, ContractError> {
        ContractArtifact::from_json(self.artifact_json())
    }

    pub fn factory(&self) -> Result<ContractFactory, ContractError> {
        ContractFactory::new(self.artifact()?)
    }
}

impl FromStr for KnownContract {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "comdao" => Ok(KnownContract::ComDao),
            "sgbmanager" => Ok(KnownContract::SgbManager),
            _ => Err(anyhow!(
                "Unknown contract '{}'. Available contracts: ComDAO, SGBManager",
                s
            )),
        }
    }
}

impl fmt::Display for KnownContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn uint(value: U256) -> DynSolValue {
    DynSolValue::Uint(value, 256)
}

pub(crate) fn int(value: I256) -> DynSolValue {
    DynSolValue::Int(value, 256)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub recipient: Address,
    pub amount: U256,
    pub description: String,
    pub voting_deadline: U256,
    pub executed: bool,
    pub proposal_passed: bool,
    pub number_of_votes: U256,
    pub current_result: I256,
    pub proposal_hash: B256,
}

impl Proposal {
    pub fn from_outputs(method: &str, values: &[DynSolValue]) -> Result<Self, ContractError> {
        let mut out = OutputReader::new(method, values);
        Ok(Self {
            recipient: out.address()?,
            amount: out.uint()?,
            description: out.string()?,
            voting_deadline: out.uint()?,
            executed: out.bool()?,
            proposal_passed: out.bool()?,
            number_of_votes: out.uint()?,
            current_result: out.int()?,
            proposal_hash: out.bytes32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub member: Address,
    pub name: String,
    pub member_since: U256,
}

impl Member {
    pub fn from_outputs(method: &str, values: &[DynSolValue]) -> Result<Self, ContractError> {
        let mut out = OutputReader::new(method, values);
        Ok(Self {
            member: out.address()?,
            name: out.string()?,
            member_since: out.uint()?,
        })
    }
}

/// A smart garbage bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SgbRecord {
    pub sgb_id: U256,
    pub lat: String,
    pub lon: String,
    pub rate: U256,
    pub max_capacity: U256,
    pub current_waste_level: U256,
    pub owner_account: Address,
}

impl SgbRecord {
    pub fn from_outputs(method: &str, values: &[DynSolValue]) -> Result<Self, ContractError> {
        let mut out = OutputReader::new(method, values);
        Ok(Self {
            sgb_id: out.uint()?,
            lat: out.string()?,
            lon: out.string()?,
            rate: out.uint()?,
            max_capacity: out.uint()?,
            current_waste_level: out.uint()?,
            owner_account: out.address()?,
        })
    }
}

/// One waste drop-off.
#[derive(Debug, Clone, PartialEq)]
pub struct WasteRecord {
    pub record_id: U256,
    pub user: Address,
    pub sgb_id: U256,
    pub amount_of_waste: U256,
    pub message: String,
}

impl WasteRecord {
    pub fn from_outputs(method: &str, values: &[DynSolValue]) -> Result<Self, ContractError> {
        let mut out = OutputReader::new(method, values);
        Ok(Self {
            record_id: out.uint()?,
            user: out.address()?,
            sgb_id: out.uint()?,
            amount_of_waste: out.uint()?,
            message: out.string()?,
        })
    }
}

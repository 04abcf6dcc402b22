use super::profile::{Profile, ProfileId};
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub i64);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Terminated => "terminated",
        }
    }
}

impl FromStr for ContractStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "terminated" => Ok(Self::Terminated),
            other => Err(PaymentError::ValidationError(format!(
                "Unknown contract status: {other}"
            ))),
        }
    }
}

/// Agreement between one client and one contractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub terms: String,
    pub status: ContractStatus,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
}

impl Contract {
    /// True when `profile` is either party of the contract.
    pub fn involves(&self, profile: ProfileId) -> bool {
        self.client_id == profile || self.contractor_id == profile
    }

    pub fn is_active(&self) -> bool {
        self.status != ContractStatus::Terminated
    }
}

/// A contract with both parties resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDetails {
    #[serde(flatten)]
    pub contract: Contract,
    pub client: Profile,
    pub contractor: Profile,
}

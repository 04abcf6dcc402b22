use super::contract::{Contract, ContractId};
use super::job::Job;
use super::profile::{Profile, ProfileId, ProfileKind};
use crate::error::{PaymentError, Result};
use std::collections::{HashMap, HashSet};

/// A complete set of records to load into an empty store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub profiles: Vec<Profile>,
    pub contracts: Vec<Contract>,
    pub jobs: Vec<Job>,
}

/// Record counts reported after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub profiles: usize,
    pub contracts: usize,
    pub jobs: usize,
}

impl Dataset {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            profiles: self.profiles.len(),
            contracts: self.contracts.len(),
            jobs: self.jobs.len(),
        }
    }

    /// Checks referential integrity and the record invariants before anything is written.
    pub fn validate(&self) -> Result<()> {
        let mut kinds: HashMap<ProfileId, ProfileKind> = HashMap::new();
        for profile in &self.profiles {
            if profile.balance.value().is_sign_negative() {
                return Err(invalid(format!("profile {} has a negative balance", profile.id)));
            }
            if kinds.insert(profile.id, profile.kind).is_some() {
                return Err(invalid(format!("duplicate profile id {}", profile.id)));
            }
        }

        let mut contracts: HashSet<ContractId> = HashSet::new();
        for contract in &self.contracts {
            if !contracts.insert(contract.id) {
                return Err(invalid(format!("duplicate contract id {}", contract.id)));
            }
            if contract.client_id == contract.contractor_id {
                return Err(invalid(format!(
                    "contract {} has the same client and contractor",
                    contract.id
                )));
            }
            if kinds.get(&contract.client_id) != Some(&ProfileKind::Client) {
                return Err(invalid(format!(
                    "contract {} client {} is not a client profile",
                    contract.id, contract.client_id
                )));
            }
            if kinds.get(&contract.contractor_id) != Some(&ProfileKind::Contractor) {
                return Err(invalid(format!(
                    "contract {} contractor {} is not a contractor profile",
                    contract.id, contract.contractor_id
                )));
            }
        }

        let mut jobs = HashSet::new();
        for job in &self.jobs {
            if !jobs.insert(job.id) {
                return Err(invalid(format!("duplicate job id {}", job.id)));
            }
            if !contracts.contains(&job.contract_id) {
                return Err(invalid(format!(
                    "job {} references unknown contract {}",
                    job.id, job.contract_id
                )));
            }
            if job.price.value().is_sign_negative() {
                return Err(invalid(format!("job {} has a negative price", job.id)));
            }
            if job.is_paid() && job.payment_date.is_none() {
                return Err(invalid(format!(
                    "job {} is paid but has no payment date",
                    job.id
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> PaymentError {
    PaymentError::ValidationError(format!("Invalid dataset: {message}"))
}

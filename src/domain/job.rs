use super::contract::{Contract, ContractDetails, ContractId};
use super::money::Money;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A billable unit of work under a contract.
///
/// `paid` is tri-state: `None` is treated exactly like `Some(false)`.
/// Once `paid` is `Some(true)`, `payment_date` is set and the payment fields never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub price: Money,
    pub paid: Option<bool>,
    pub payment_date: Option<DateTime<Utc>>,
    pub contract_id: ContractId,
}

impl Job {
    pub fn is_paid(&self) -> bool {
        self.paid == Some(true)
    }

    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Result<()> {
        if self.is_paid() {
            return Err(PaymentError::NotFound("Job already paid".to_string()));
        }
        self.paid = Some(true);
        self.payment_date = Some(at);
        Ok(())
    }
}

/// A job together with the contract it is billed against.
#[derive(Debug, Clone, PartialEq)]
pub struct PayableJob {
    pub job: Job,
    pub contract: Contract,
}

/// A job with its contract and both contract parties, as listed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    #[serde(flatten)]
    pub job: Job,
    pub contract: ContractDetails,
}

use super::guard;
use crate::domain::contract::ContractId;
use crate::domain::job::{JobId, PayableJob};
use crate::domain::money::Money;
use crate::domain::ports::{TransactionalStoreBox, UnitOfWork};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of a successful job payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub job_id: JobId,
    pub contract_id: ContractId,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
    pub client_balance: Money,
    pub contractor_balance: Money,
}

/// Moves a job's price from the contract's client to its contractor.
///
/// Every payment runs inside a single unit of work: the affordability check, both
/// balance updates and the paid flag either all land or none do.
pub struct PaymentEngine {
    store: TransactionalStoreBox,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` over a transactional store.
    pub fn new(store: TransactionalStoreBox) -> Self {
        Self { store }
    }

    /// Pays for a job on behalf of its contract's client.
    ///
    /// # Arguments
    ///
    /// * `job_id` - The job to pay for.
    /// * `payer` - The resolved caller. Must be the contract's client.
    ///
    /// Fails with `NotFound` for unknown or already-paid jobs and for jobs outside the
    /// payer's contracts, `Forbidden` when the payer is the contractor, and
    /// `InsufficientFunds` when the client's current balance is below the price.
    pub async fn pay(&self, job_id: JobId, payer: &Profile) -> Result<PaymentReceipt> {
        let mut uow = self.store.begin().await?;
        match transfer(uow.as_mut(), job_id, payer).await {
            Ok(receipt) => {
                uow.commit().await?;
                info!(
                    job = %receipt.job_id,
                    client = %receipt.client_id,
                    contractor = %receipt.contractor_id,
                    amount = %receipt.amount,
                    "job paid"
                );
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback) = uow.rollback().await {
                    warn!(job = %job_id, error = %rollback, "failed to roll back payment");
                }
                Err(e)
            }
        }
    }
}

async fn transfer(
    uow: &mut dyn UnitOfWork,
    job_id: JobId,
    payer: &Profile,
) -> Result<PaymentReceipt> {
    let PayableJob { job, contract } = uow
        .payable_job(job_id)
        .await?
        .ok_or_else(|| PaymentError::NotFound("Job not found".to_string()))?;
    guard::ensure_can_pay(payer, &contract)?;
    if job.is_paid() {
        return Err(PaymentError::NotFound("Job already paid".to_string()));
    }

    // The caller's profile was read before the transaction; only this copy is current.
    let client = uow
        .profile(payer.id)
        .await?
        .ok_or_else(|| PaymentError::NotFound(format!("Profile {} not found", payer.id)))?;
    if client.balance < job.price {
        return Err(PaymentError::InsufficientFunds);
    }

    let client_balance = uow.debit(client.id, job.price).await?;
    let contractor_balance = uow.credit(contract.contractor_id, job.price).await?;
    let paid_at = Utc::now().trunc_subsecs(3);
    uow.mark_paid(job.id, paid_at).await?;

    Ok(PaymentReceipt {
        job_id: job.id,
        contract_id: contract.id,
        client_id: client.id,
        contractor_id: contract.contractor_id,
        amount: job.price,
        paid_at,
        client_balance,
        contractor_balance,
    })
}

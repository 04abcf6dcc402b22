use crate::domain::contract::{Contract, ContractDetails, ContractId, ContractStatus};
use crate::domain::dataset::{Dataset, ImportSummary};
use crate::domain::job::{Job, JobDetails, JobId, PayableJob};
use crate::domain::money::Money;
use crate::domain::ports::{
    DatasetImporter, ReadStore, TransactionalStore, UnitOfWork, UnitOfWorkBox,
};
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::report::{ClientSpending, DateRange, ProfessionEarnings};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

#[derive(Debug, Default, Clone)]
struct Tables {
    profiles: BTreeMap<ProfileId, Profile>,
    contracts: BTreeMap<ContractId, Contract>,
    jobs: BTreeMap<JobId, Job>,
}

impl Tables {
    fn is_empty(&self) -> bool {
        self.profiles.is_empty() && self.contracts.is_empty() && self.jobs.is_empty()
    }

    fn party(&self, id: ProfileId) -> Result<Profile> {
        self.profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| PaymentError::internal(format!("dangling profile reference {id}")))
    }

    fn details(&self, contract: &Contract) -> Result<ContractDetails> {
        Ok(ContractDetails {
            contract: contract.clone(),
            client: self.party(contract.client_id)?,
            contractor: self.party(contract.contractor_id)?,
        })
    }

    fn contract_of(&self, job: &Job) -> Result<&Contract> {
        self.contracts.get(&job.contract_id).ok_or_else(|| {
            PaymentError::internal(format!("job {} references a missing contract", job.id))
        })
    }

    fn profile_mut(&mut self, id: ProfileId) -> Result<&mut Profile> {
        self.profiles
            .get_mut(&id)
            .ok_or_else(|| PaymentError::NotFound(format!("Profile {id} not found")))
    }

    /// Paid jobs inside `range`, each paired with its contract.
    fn paid_in(&self, range: DateRange) -> Result<Vec<(&Job, &Contract)>> {
        let mut paid = Vec::new();
        for job in self.jobs.values() {
            if job.is_paid() && job.payment_date.is_some_and(|at| range.contains(at)) {
                paid.push((job, self.contract_of(job)?));
            }
        }
        Ok(paid)
    }
}

/// A thread-safe in-memory relational store.
///
/// Uses `Arc<RwLock<..>>` so clones share the same tables. A unit of work holds the
/// write lock for its whole lifetime and mutates a staged copy, which is swapped in on
/// commit and dropped on rollback. Ideal for testing or ephemeral runs.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadStore for InMemoryStore {
    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&id).cloned())
    }

    async fn contract(&self, id: ContractId) -> Result<Option<ContractDetails>> {
        let tables = self.tables.read().await;
        tables
            .contracts
            .get(&id)
            .map(|contract| tables.details(contract))
            .transpose()
    }

    async fn active_contracts(&self, profile: ProfileId) -> Result<Vec<ContractDetails>> {
        let tables = self.tables.read().await;
        tables
            .contracts
            .values()
            .filter(|c| c.is_active() && c.involves(profile))
            .map(|c| tables.details(c))
            .collect()
    }

    async fn unpaid_jobs(&self, profile: ProfileId) -> Result<Vec<JobDetails>> {
        let tables = self.tables.read().await;
        let mut jobs = Vec::new();
        for job in tables.jobs.values().filter(|job| !job.is_paid()) {
            let contract = tables.contract_of(job)?;
            if contract.status == ContractStatus::InProgress && contract.involves(profile) {
                jobs.push(JobDetails {
                    job: job.clone(),
                    contract: tables.details(contract)?,
                });
            }
        }
        Ok(jobs)
    }

    async fn best_profession(&self, range: DateRange) -> Result<Option<ProfessionEarnings>> {
        let tables = self.tables.read().await;
        let mut earnings: BTreeMap<String, Money> = BTreeMap::new();
        for (job, contract) in tables.paid_in(range)? {
            let contractor = tables.party(contract.contractor_id)?;
            *earnings.entry(contractor.profession).or_default() += job.price;
        }
        // Highest total wins; ties go to the alphabetically first profession.
        Ok(earnings
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(profession, total_earned)| ProfessionEarnings {
                profession,
                total_earned,
            }))
    }

    async fn best_clients(&self, range: DateRange, limit: u32) -> Result<Vec<ClientSpending>> {
        let tables = self.tables.read().await;
        let mut spending: BTreeMap<ProfileId, Money> = BTreeMap::new();
        for (job, contract) in tables.paid_in(range)? {
            *spending.entry(contract.client_id).or_default() += job.price;
        }
        let mut ranked = spending
            .into_iter()
            .map(|(id, paid)| -> Result<ClientSpending> {
                Ok(ClientSpending {
                    id,
                    full_name: tables.party(id)?.full_name(),
                    paid,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        ranked.sort_by(|a, b| b.paid.cmp(&a.paid).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit as usize);
        Ok(ranked)
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        let guard = self.tables.clone().write_owned().await;
        let staged = (*guard).clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, staged }))
    }
}

#[async_trait]
impl DatasetImporter for InMemoryStore {
    async fn import(&self, dataset: Dataset) -> Result<ImportSummary> {
        dataset.validate()?;
        let mut tables = self.tables.write().await;
        if !tables.is_empty() {
            return Err(PaymentError::ValidationError(
                "Store already contains data".to_string(),
            ));
        }
        let summary = dataset.summary();
        tables.profiles = dataset.profiles.into_iter().map(|p| (p.id, p)).collect();
        tables.contracts = dataset.contracts.into_iter().map(|c| (c.id, c)).collect();
        tables.jobs = dataset.jobs.into_iter().map(|j| (j.id, j)).collect();
        debug!(?summary, "imported dataset into memory");
        Ok(summary)
    }
}

/// Exclusive transaction over an [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn payable_job(&mut self, id: JobId) -> Result<Option<PayableJob>> {
        let Some(job) = self.staged.jobs.get(&id) else {
            return Ok(None);
        };
        let contract = self.staged.contract_of(job)?.clone();
        Ok(Some(PayableJob {
            job: job.clone(),
            contract,
        }))
    }

    async fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.staged.profiles.get(&id).cloned())
    }

    async fn outstanding_for_client(&mut self, client: ProfileId) -> Result<Money> {
        let mut total = Money::ZERO;
        for job in self.staged.jobs.values().filter(|job| !job.is_paid()) {
            if self.staged.contract_of(job)?.client_id == client {
                total += job.price;
            }
        }
        Ok(total)
    }

    async fn credit(&mut self, id: ProfileId, amount: Money) -> Result<Money> {
        let profile = self.staged.profile_mut(id)?;
        profile.balance += amount;
        Ok(profile.balance)
    }

    async fn debit(&mut self, id: ProfileId, amount: Money) -> Result<Money> {
        let profile = self.staged.profile_mut(id)?;
        if profile.balance < amount {
            return Err(PaymentError::InsufficientFunds);
        }
        profile.balance -= amount;
        Ok(profile.balance)
    }

    async fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<()> {
        self.staged
            .jobs
            .get_mut(&id)
            .ok_or_else(|| PaymentError::NotFound("Job not found".to_string()))?
            .mark_paid(at)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // Dropping the staged copy releases the lock with the tables untouched.
        Ok(())
    }
}

use super::contract::{ContractDetails, ContractId};
use super::dataset::{Dataset, ImportSummary};
use super::job::{JobDetails, JobId, PayableJob};
use super::money::Money;
use super::profile::{Profile, ProfileId};
use super::report::{ClientSpending, DateRange, ProfessionEarnings};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Queries answered outside of a unit of work.
#[async_trait]
pub trait ReadStore: Send + Sync {
    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>>;
    async fn contract(&self, id: ContractId) -> Result<Option<ContractDetails>>;
    /// Non-terminated contracts where `profile` is client or contractor, ordered by id.
    async fn active_contracts(&self, profile: ProfileId) -> Result<Vec<ContractDetails>>;
    /// Unpaid jobs on in-progress contracts involving `profile`, ordered by id.
    async fn unpaid_jobs(&self, profile: ProfileId) -> Result<Vec<JobDetails>>;
    async fn best_profession(&self, range: DateRange) -> Result<Option<ProfessionEarnings>>;
    async fn best_clients(&self, range: DateRange, limit: u32) -> Result<Vec<ClientSpending>>;
}

/// Opens isolated read-check-write sequences over the store.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin(&self) -> Result<UnitOfWorkBox>;
}

/// One store transaction.
///
/// Two units of work touching the same rows are serialised by the store. Nothing is
/// visible to other readers until `commit`; `rollback` (or a failed `commit`)
/// leaves the store exactly as it was before `begin`.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Loads a job with its contract, whatever its paid state.
    async fn payable_job(&mut self, id: JobId) -> Result<Option<PayableJob>>;
    async fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>>;
    /// Sum of prices of unpaid jobs on contracts whose client is `client`.
    async fn outstanding_for_client(&mut self, client: ProfileId) -> Result<Money>;
    /// Adds `amount` to the balance and returns the new balance.
    async fn credit(&mut self, id: ProfileId, amount: Money) -> Result<Money>;
    /// Subtracts `amount` from the balance and returns the new balance.
    ///
    /// Fails with `InsufficientFunds` rather than letting the balance go negative.
    async fn debit(&mut self, id: ProfileId, amount: Money) -> Result<Money>;
    /// Fails with `NotFound` if the job is already paid.
    async fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Bulk loading of seed data.
#[async_trait]
pub trait DatasetImporter: Send + Sync {
    async fn import(&self, dataset: Dataset) -> Result<ImportSummary>;
}

pub type ReadStoreBox = Box<dyn ReadStore>;
pub type TransactionalStoreBox = Box<dyn TransactionalStore>;
pub type UnitOfWorkBox = Box<dyn UnitOfWork>;

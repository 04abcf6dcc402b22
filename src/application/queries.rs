use super::guard;
use crate::domain::contract::{ContractDetails, ContractId};
use crate::domain::job::JobDetails;
use crate::domain::ports::ReadStoreBox;
use crate::domain::profile::Profile;
use crate::error::{PaymentError, Result};

/// Read-side views of contracts and jobs, scoped to the viewing profile.
pub struct ContractQueries {
    store: ReadStoreBox,
}

impl ContractQueries {
    pub fn new(store: ReadStoreBox) -> Self {
        Self { store }
    }

    /// Returns a contract if `viewer` is one of its parties.
    ///
    /// # Arguments
    ///
    /// * `id` - The contract to look up.
    /// * `viewer` - The resolved caller.
    pub async fn contract(&self, id: ContractId, viewer: &Profile) -> Result<ContractDetails> {
        let details = self
            .store
            .contract(id)
            .await?
            .ok_or_else(|| PaymentError::NotFound("Contract not found".to_string()))?;
        guard::ensure_can_view_contract(viewer, &details.contract)?;
        Ok(details)
    }

    /// Lists the viewer's non-terminated contracts, ordered by id.
    pub async fn active_contracts(&self, viewer: &Profile) -> Result<Vec<ContractDetails>> {
        self.store.active_contracts(viewer.id).await
    }

    /// Lists unpaid jobs on the viewer's in-progress contracts.
    pub async fn unpaid_jobs(&self, viewer: &Profile) -> Result<Vec<JobDetails>> {
        self.store.unpaid_jobs(viewer.id).await
    }
}

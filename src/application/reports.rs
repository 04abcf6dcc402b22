use crate::domain::ports::ReadStoreBox;
use crate::domain::report::{ClientSpending, DateRange, ProfessionEarnings};
use crate::error::{PaymentError, Result};

pub const DEFAULT_CLIENT_LIMIT: u32 = 2;

/// Earnings and spending reports over paid jobs.
pub struct AdminReports {
    store: ReadStoreBox,
}

impl AdminReports {
    pub fn new(store: ReadStoreBox) -> Self {
        Self { store }
    }

    /// Finds the profession that earned the most from jobs paid within `range`.
    ///
    /// Returns `None` when nothing was paid in the window.
    pub async fn best_profession(&self, range: DateRange) -> Result<Option<ProfessionEarnings>> {
        self.store.best_profession(range).await
    }

    /// Ranks clients by what they paid within `range`, highest first.
    ///
    /// # Arguments
    ///
    /// * `range` - Inclusive payment-date window.
    /// * `limit` - Maximum number of clients. Defaults to `DEFAULT_CLIENT_LIMIT`; zero is rejected.
    pub async fn best_clients(
        &self,
        range: DateRange,
        limit: Option<u32>,
    ) -> Result<Vec<ClientSpending>> {
        let limit = limit.unwrap_or(DEFAULT_CLIENT_LIMIT);
        if limit == 0 {
            return Err(PaymentError::ValidationError(
                "limit must be at least 1".to_string(),
            ));
        }
        self.store.best_clients(range, limit).await
    }
}

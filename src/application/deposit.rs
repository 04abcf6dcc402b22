use super::guard;
use crate::domain::money::{Amount, Money};
use crate::domain::ports::{TransactionalStoreBox, UnitOfWork};
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{info, warn};

/// Share of a client's unpaid obligations that may be deposited at once.
pub const DEPOSIT_CAP_RATIO: Decimal = dec!(0.25);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    pub profile_id: ProfileId,
    pub deposited: Money,
    pub balance: Money,
}

/// Credits a client's own balance, bounded by what they still owe.
pub struct DepositEngine {
    store: TransactionalStoreBox,
}

impl DepositEngine {
    pub fn new(store: TransactionalStoreBox) -> Self {
        Self { store }
    }

    /// Deposits `min(requested, 25% of outstanding)` into the caller's balance.
    ///
    /// # Arguments
    ///
    /// * `target` - The profile to credit. Must be the caller.
    /// * `caller` - The resolved caller. Must be a client.
    /// * `requested` - The amount asked for. Must be positive.
    pub async fn deposit(
        &self,
        target: ProfileId,
        caller: &Profile,
        requested: Decimal,
    ) -> Result<DepositReceipt> {
        guard::ensure_can_deposit(caller, target)?;
        let requested = Amount::new(requested).map_err(|_| {
            PaymentError::ValidationError("Deposit amount must be positive".to_string())
        })?;

        let mut uow = self.store.begin().await?;
        match credit_capped(uow.as_mut(), caller.id, requested).await {
            Ok(receipt) => {
                uow.commit().await?;
                info!(
                    profile = %receipt.profile_id,
                    requested = %requested.money(),
                    deposited = %receipt.deposited,
                    "deposit credited"
                );
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback) = uow.rollback().await {
                    warn!(profile = %caller.id, error = %rollback, "failed to roll back deposit");
                }
                Err(e)
            }
        }
    }
}

async fn credit_capped(
    uow: &mut dyn UnitOfWork,
    client: ProfileId,
    requested: Amount,
) -> Result<DepositReceipt> {
    let owed = uow.outstanding_for_client(client).await?;
    let cap = owed.portion(DEPOSIT_CAP_RATIO);
    if !cap.is_positive() {
        return Err(PaymentError::Forbidden(
            "No pending jobs to pay for".to_string(),
        ));
    }
    let deposited = cap.min(requested.money());
    let balance = uow.credit(client, deposited).await?;
    Ok(DepositReceipt {
        profile_id: client,
        deposited,
        balance,
    })
}

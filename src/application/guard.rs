//! Authorization rules. Every function is pure: it looks only at the records it is given.

use crate::domain::contract::Contract;
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{PaymentError, Result};

pub fn ensure_can_view_contract(viewer: &Profile, contract: &Contract) -> Result<()> {
    if contract.involves(viewer.id) {
        Ok(())
    } else {
        Err(PaymentError::Forbidden(
            "Profile not associated with this contract".to_string(),
        ))
    }
}

/// Only the contract's client may pay. Outsiders learn nothing about the job.
pub fn ensure_can_pay(payer: &Profile, contract: &Contract) -> Result<()> {
    if !contract.involves(payer.id) {
        return Err(PaymentError::NotFound("Job not found".to_string()));
    }
    if contract.client_id != payer.id {
        return Err(PaymentError::Forbidden(
            "Only the contract's client can pay for this job".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_can_deposit(caller: &Profile, target: ProfileId) -> Result<()> {
    if !caller.is_client() {
        return Err(PaymentError::Forbidden(
            "Only clients can make deposits".to_string(),
        ));
    }
    if caller.id != target {
        return Err(PaymentError::Forbidden(
            "You can only deposit to your own account".to_string(),
        ));
    }
    Ok(())
}

/// Checks a presented admin key against the configured one.
///
/// Without a configured key every request is refused, whether or not it carries one.
pub fn ensure_admin(configured: Option<&str>, presented: Option<&str>) -> Result<()> {
    let expected = match configured {
        Some(key) if !key.is_empty() => key,
        _ => {
            return Err(PaymentError::Forbidden(
                "Admin endpoints are disabled".to_string(),
            ));
        }
    };
    let presented = presented.ok_or_else(|| {
        PaymentError::Unauthorized("Missing admin_key in header".to_string())
    })?;
    if presented == expected {
        Ok(())
    } else {
        Err(PaymentError::Forbidden("Invalid admin key".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{ContractId, ContractStatus};
    use crate::domain::money::Money;
    use crate::domain::profile::ProfileKind;

    fn profile(id: i64, kind: ProfileKind) -> Profile {
        Profile {
            id: ProfileId(id),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            profession: "Tester".to_string(),
            balance: Money::ZERO,
            kind,
        }
    }

    fn contract() -> Contract {
        Contract {
            id: ContractId(1),
            terms: "terms".to_string(),
            status: ContractStatus::InProgress,
            client_id: ProfileId(1),
            contractor_id: ProfileId(5),
        }
    }

    #[test]
    fn test_contract_visibility() {
        let contract = contract();
        assert!(ensure_can_view_contract(&profile(1, ProfileKind::Client), &contract).is_ok());
        assert!(ensure_can_view_contract(&profile(5, ProfileKind::Contractor), &contract).is_ok());
        let err = ensure_can_view_contract(&profile(2, ProfileKind::Client), &contract);
        assert!(matches!(err, Err(PaymentError::Forbidden(_))));
    }

    #[test]
    fn test_only_client_can_pay() {
        let contract = contract();
        assert!(ensure_can_pay(&profile(1, ProfileKind::Client), &contract).is_ok());
        assert!(matches!(
            ensure_can_pay(&profile(5, ProfileKind::Contractor), &contract),
            Err(PaymentError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_can_pay(&profile(2, ProfileKind::Client), &contract),
            Err(PaymentError::NotFound(_))
        ));
    }

    #[test]
    fn test_deposit_rules() {
        let client = profile(1, ProfileKind::Client);
        assert!(ensure_can_deposit(&client, ProfileId(1)).is_ok());

        let err = ensure_can_deposit(&client, ProfileId(2)).unwrap_err();
        assert_eq!(err.to_string(), "You can only deposit to your own account");

        let contractor = profile(5, ProfileKind::Contractor);
        let err = ensure_can_deposit(&contractor, ProfileId(5)).unwrap_err();
        assert_eq!(err.to_string(), "Only clients can make deposits");
    }

    #[test]
    fn test_admin_key() {
        assert!(ensure_admin(Some("k"), Some("k")).is_ok());
        assert!(matches!(
            ensure_admin(Some("k"), None),
            Err(PaymentError::Unauthorized(_))
        ));
        assert!(matches!(
            ensure_admin(Some("k"), Some("x")),
            Err(PaymentError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_admin(None, Some("k")),
            Err(PaymentError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_disabled_without_configured_key() {
        for configured in [None, Some("")] {
            assert!(matches!(
                ensure_admin(configured, None),
                Err(PaymentError::Forbidden(_))
            ));
            assert!(matches!(
                ensure_admin(configured, Some("")),
                Err(PaymentError::Forbidden(_))
            ));
        }
    }
}

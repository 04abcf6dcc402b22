use crate::domain::ports::ReadStoreBox;
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{PaymentError, Result};

/// Turns the caller-supplied `profile_id` header into a stored profile.
pub struct IdentityResolver {
    store: ReadStoreBox,
}

impl IdentityResolver {
    pub fn new(store: ReadStoreBox) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, header: Option<&str>) -> Result<Profile> {
        let raw = header.ok_or_else(|| {
            PaymentError::Unauthorized("Missing profile_id in header".to_string())
        })?;
        let id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid_profile())?;
        self.store
            .profile(ProfileId(id))
            .await?
            .ok_or_else(invalid_profile)
    }
}

fn invalid_profile() -> PaymentError {
    PaymentError::Unauthorized("Invalid profile_id".to_string())
}

use super::AppState;
use super::error::ApiError;
use crate::application::guard;
use crate::domain::profile::Profile;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const PROFILE_HEADER: &str = "profile_id";
pub const ADMIN_HEADER: &str = "admin_key";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    // Non-UTF-8 values are passed through as empty and rejected downstream.
    parts
        .headers
        .get(name)
        .map(|value| value.to_str().unwrap_or_default())
}

/// The profile identified by the `profile_id` header.
#[derive(Debug, Clone)]
pub struct CurrentProfile(pub Profile);

impl FromRequestParts<AppState> for CurrentProfile {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let profile = state
            .identity
            .resolve(header(parts, PROFILE_HEADER))
            .await?;
        Ok(Self(profile))
    }
}

/// Proof that the request carried the configured `admin_key`.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard::ensure_admin(state.admin_key.as_deref(), header(parts, ADMIN_HEADER))?;
        Ok(Self)
    }
}

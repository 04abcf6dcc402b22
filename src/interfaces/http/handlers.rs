use super::AppState;
use super::error::ApiError;
use super::extract::{AdminAccess, CurrentProfile};
use crate::application::deposit::DepositReceipt;
use crate::application::payment::PaymentReceipt;
use crate::domain::contract::{ContractDetails, ContractId};
use crate::domain::job::{JobDetails, JobId};
use crate::domain::profile::ProfileId;
use crate::domain::report::{ClientSpending, DateRange, ProfessionEarnings};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// === Request/Response DTOs ===

/// Request body for `POST /balances/deposit/{user_id}`.
///
/// `amount` accepts a JSON number or a decimal string.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

fn date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, ApiError> {
    Ok(DateRange::parse(start, end)?)
}

#[derive(Debug, Deserialize)]
pub struct BestClientsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub receipt: PaymentReceipt,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub message: String,
    #[serde(flatten)]
    pub receipt: DepositReceipt,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BestProfessionResponse {
    Found(ProfessionEarnings),
    Empty { message: &'static str },
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// === Handlers ===

/// GET /contracts/{id}
pub async fn get_contract(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ContractDetails>, ApiError> {
    let Path(id) = path?;
    let contract = state.queries.contract(ContractId(id), &profile).await?;
    Ok(Json(contract))
}

/// GET /contracts
pub async fn list_contracts(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
) -> Result<Json<Vec<ContractDetails>>, ApiError> {
    Ok(Json(state.queries.active_contracts(&profile).await?))
}

/// GET /jobs/unpaid
pub async fn unpaid_jobs(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
) -> Result<Json<Vec<JobDetails>>, ApiError> {
    Ok(Json(state.queries.unpaid_jobs(&profile).await?))
}

/// POST /jobs/{job_id}/pay
pub async fn pay_job(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let Path(job_id) = path?;
    let receipt = state.payments.pay(JobId(job_id), &profile).await?;
    Ok(Json(PaymentResponse {
        message: "Payment successful",
        receipt,
    }))
}

/// POST /balances/deposit/{user_id}
pub async fn deposit(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Json<DepositResponse>, ApiError> {
    let Path(user_id) = path?;
    let Json(request) = body?;
    let receipt = state
        .deposits
        .deposit(ProfileId(user_id), &profile, request.amount)
        .await?;
    Ok(Json(DepositResponse {
        message: format!(
            "Deposit of ${} successful. New balance: ${}",
            receipt.deposited, receipt.balance
        ),
        receipt,
    }))
}

/// GET /admin/best-profession?start&end
pub async fn best_profession(
    State(state): State<AppState>,
    _admin: AdminAccess,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<BestProfessionResponse>, ApiError> {
    let Query(query) = query?;
    let range = date_range(query.start.as_deref(), query.end.as_deref())?;
    let response = match state.reports.best_profession(range).await? {
        Some(earnings) => BestProfessionResponse::Found(earnings),
        None => BestProfessionResponse::Empty {
            message: "No data available for the specified time range",
        },
    };
    Ok(Json(response))
}

/// GET /admin/best-clients?start&end&limit
pub async fn best_clients(
    State(state): State<AppState>,
    _admin: AdminAccess,
    query: Result<Query<BestClientsQuery>, QueryRejection>,
) -> Result<Json<Vec<ClientSpending>>, ApiError> {
    let Query(query) = query?;
    let clients = state
        .reports
        .best_clients(
            date_range(query.start.as_deref(), query.end.as_deref())?,
            query.limit,
        )
        .await?;
    Ok(Json(clients))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

//! HTTP surface: axum router, request extractors and error mapping.
//!
//! ## Endpoints
//!
//! - `GET /contracts/{id}` - A contract the caller is party to
//! - `GET /contracts` - The caller's non-terminated contracts
//! - `GET /jobs/unpaid` - Unpaid jobs on the caller's in-progress contracts
//! - `POST /jobs/{job_id}/pay` - Pay for a job
//! - `POST /balances/deposit/{user_id}` - Deposit into the caller's own balance
//! - `GET /admin/best-profession?start&end` - Highest-earning profession
//! - `GET /admin/best-clients?start&end&limit` - Highest-paying clients
//! - `GET /health` - Liveness probe
//!
//! Callers identify themselves with the `profile_id` header; admin routes also
//! require the `admin_key` header.

pub mod error;
pub mod extract;
pub mod handlers;

use crate::application::deposit::DepositEngine;
use crate::application::identity::IdentityResolver;
use crate::application::payment::PaymentEngine;
use crate::application::queries::ContractQueries;
use crate::application::reports::AdminReports;
use crate::domain::ports::{ReadStore, TransactionalStore};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityResolver>,
    pub payments: Arc<PaymentEngine>,
    pub deposits: Arc<DepositEngine>,
    pub queries: Arc<ContractQueries>,
    pub reports: Arc<AdminReports>,
    pub admin_key: Option<Arc<str>>,
}

impl AppState {
    /// Wires every component to clones of the same store.
    pub fn new<S>(store: S, admin_key: Option<String>) -> Self
    where
        S: ReadStore + TransactionalStore + Clone + 'static,
    {
        Self {
            identity: Arc::new(IdentityResolver::new(Box::new(store.clone()))),
            payments: Arc::new(PaymentEngine::new(Box::new(store.clone()))),
            deposits: Arc::new(DepositEngine::new(Box::new(store.clone()))),
            queries: Arc::new(ContractQueries::new(Box::new(store.clone()))),
            reports: Arc::new(AdminReports::new(Box::new(store))),
            admin_key: admin_key.map(Arc::from),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/contracts", get(handlers::list_contracts))
        .route("/contracts/{id}", get(handlers::get_contract))
        .route("/jobs/unpaid", get(handlers::unpaid_jobs))
        .route("/jobs/{job_id}/pay", post(handlers::pay_job))
        .route("/balances/deposit/{user_id}", post(handlers::deposit))
        .route("/admin/best-profession", get(handlers::best_profession))
        .route("/admin/best-clients", get(handlers::best_clients))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

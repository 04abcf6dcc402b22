//! End-to-end tests of the HTTP surface, driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::http::StatusCode;
use common::{ADMIN_KEY, json_request, memory_app};
use jobledger::domain::contract::{Contract, ContractId, ContractStatus};
use jobledger::domain::dataset::Dataset;
use jobledger::domain::job::{Job, JobId};
use jobledger::domain::money::Money;
use jobledger::domain::ports::{DatasetImporter, ReadStore};
use jobledger::domain::profile::{Profile, ProfileId, ProfileKind};
use jobledger::infrastructure::in_memory::InMemoryStore;
use jobledger::interfaces::http::{AppState, create_router};
use rust_decimal_macros::dec;
use serde_json::json;

fn profile(id: i64, balance: Money, kind: ProfileKind) -> Profile {
    Profile {
        id: ProfileId(id),
        first_name: format!("First{id}"),
        last_name: format!("Last{id}"),
        profession: "Tester".to_string(),
        balance,
        kind,
    }
}

fn contract(id: i64, client: i64) -> Contract {
    Contract {
        id: ContractId(id),
        terms: "terms".to_string(),
        status: ContractStatus::InProgress,
        client_id: ProfileId(client),
        contractor_id: ProfileId(10),
    }
}

fn job(id: i64, price: Money, contract: i64) -> Job {
    Job {
        id: JobId(id),
        description: "work".to_string(),
        price,
        paid: None,
        payment_date: None,
        contract_id: ContractId(contract),
    }
}

/// Client 1 holds 100, client 2 holds 10, client 3 owes 200 over two jobs.
async fn scenario_store() -> InMemoryStore {
    let dataset = Dataset {
        profiles: vec![
            profile(1, Money::new(dec!(100)), ProfileKind::Client),
            profile(2, Money::new(dec!(10)), ProfileKind::Client),
            profile(3, Money::ZERO, ProfileKind::Client),
            profile(10, Money::ZERO, ProfileKind::Contractor),
        ],
        contracts: vec![contract(1, 1), contract(2, 2), contract(3, 3)],
        jobs: vec![
            job(1, Money::new(dec!(50)), 1),
            job(2, Money::new(dec!(50)), 2),
            job(3, Money::new(dec!(120)), 3),
            job(4, Money::new(dec!(80)), 3),
        ],
    };
    let store = InMemoryStore::new();
    store.import(dataset).await.unwrap();
    store
}

async fn balance(store: &InMemoryStore, id: i64) -> Money {
    store.profile(ProfileId(id)).await.unwrap().unwrap().balance
}

#[tokio::test]
async fn test_client_pays_for_job() {
    let store = scenario_store().await;
    let app = create_router(AppState::new(store.clone(), None));

    let (status, body) = json_request(&app, "POST", "/jobs/1/pay", &[("profile_id", "1")], None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment successful");
    assert_eq!(body["amount"], "50.00");
    assert_eq!(body["clientBalance"], "50.00");
    assert_eq!(balance(&store, 1).await, Money::new(dec!(50)));
    assert_eq!(balance(&store, 10).await, Money::new(dec!(50)));

    let (status, body) = json_request(&app, "GET", "/jobs/unpaid", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_payment_with_insufficient_balance_is_forbidden() {
    let store = scenario_store().await;
    let app = create_router(AppState::new(store.clone(), None));

    let (status, body) = json_request(&app, "POST", "/jobs/2/pay", &[("profile_id", "2")], None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient balance");
    assert_eq!(balance(&store, 2).await, Money::new(dec!(10)));
    assert_eq!(balance(&store, 10).await, Money::ZERO);
}

#[tokio::test]
async fn test_deposit_is_capped_at_quarter_of_outstanding() {
    let store = scenario_store().await;
    let app = create_router(AppState::new(store.clone(), None));

    let (status, body) = json_request(
        &app,
        "POST",
        "/balances/deposit/3",
        &[("profile_id", "3")],
        Some(json!({ "amount": 1000 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deposited"], "50.00");
    assert_eq!(body["balance"], "50.00");
    assert_eq!(
        body["message"],
        "Deposit of $50.00 successful. New balance: $50.00"
    );
    assert_eq!(balance(&store, 3).await, Money::new(dec!(50)));
}

#[tokio::test]
async fn test_second_payment_is_not_found() {
    let app = memory_app().await;

    let (status, _) = json_request(&app, "POST", "/jobs/2/pay", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = json_request(&app, "POST", "/jobs/2/pay", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job already paid");
}

#[tokio::test]
async fn test_identity_errors() {
    let app = memory_app().await;

    let (status, body) = json_request(&app, "GET", "/contracts", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized - Missing profile_id in header");

    let (status, _) = json_request(&app, "GET", "/contracts", &[("profile_id", "abc")], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = json_request(&app, "GET", "/contracts", &[("profile_id", "999")], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contract_access() {
    let app = memory_app().await;

    let (status, body) = json_request(&app, "GET", "/contracts/1", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["status"], "terminated");
    assert_eq!(body["client"]["firstName"], "Harry");
    assert_eq!(body["contractor"]["type"], "contractor");

    let (status, body) = json_request(&app, "GET", "/contracts/1", &[("profile_id", "2")], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Profile not associated with this contract");

    let (status, _) = json_request(&app, "GET", "/contracts/77", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(&app, "GET", "/contracts/abc", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listings() {
    let app = memory_app().await;

    let (status, body) = json_request(&app, "GET", "/contracts", &[("profile_id", "6")], None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body.as_array().unwrap().iter().map(|c| c["id"].clone()).collect();
    assert_eq!(ids, vec![json!(2), json!(3), json!(8)]);

    let (status, body) = json_request(&app, "GET", "/jobs/unpaid", &[("profile_id", "7")], None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["id"], 4);
    assert_eq!(jobs[0]["paid"], json!(null));
    assert_eq!(jobs[0]["contract"]["client"]["id"], 2);
}

#[tokio::test]
async fn test_payment_authorization() {
    let app = memory_app().await;

    let (status, body) = json_request(&app, "POST", "/jobs/2/pay", &[("profile_id", "6")], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only the contract's client can pay for this job");

    let (status, body) = json_request(&app, "POST", "/jobs/2/pay", &[("profile_id", "3")], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found");

    let (status, _) = json_request(&app, "POST", "/jobs/x/pay", &[("profile_id", "1")], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deposit_errors() {
    let app = memory_app().await;

    let (status, body) = json_request(
        &app,
        "POST",
        "/balances/deposit/6",
        &[("profile_id", "6")],
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only clients can make deposits");

    let (status, _) = json_request(
        &app,
        "POST",
        "/balances/deposit/2",
        &[("profile_id", "1")],
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = json_request(
        &app,
        "POST",
        "/balances/deposit/3",
        &[("profile_id", "3")],
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "No pending jobs to pay for");

    let (status, _) = json_request(
        &app,
        "POST",
        "/balances/deposit/1",
        &[("profile_id", "1")],
        Some(json!({ "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = json_request(
        &app,
        "POST",
        "/balances/deposit/1",
        &[("profile_id", "1")],
        Some(json!({ "amount": "lots" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = json_request(
        &app,
        "POST",
        "/balances/deposit/1",
        &[("profile_id", "1")],
        Some(json!({ "amount": "12.5" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deposited"], "12.50");
}

#[tokio::test]
async fn test_admin_reports() {
    let app = memory_app().await;
    let admin = [("admin_key", ADMIN_KEY)];

    let (status, body) = json_request(
        &app,
        "GET",
        "/admin/best-profession?start=2020-08-10&end=2020-08-15",
        &admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "profession": "Programmer", "totalEarned": "2483.00" }));

    let (status, body) = json_request(
        &app,
        "GET",
        "/admin/best-clients?start=2020-08-10&end=2020-08-15",
        &admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": 4, "fullName": "Ash Kethcum", "paid": "2020.00" },
            { "id": 1, "fullName": "Harry Potter", "paid": "242.00" }
        ])
    );

    let (status, body) = json_request(
        &app,
        "GET",
        "/admin/best-profession?start=2030-01-01&end=2030-01-31",
        &admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "No data available for the specified time range"
    );
}

#[tokio::test]
async fn test_admin_errors() {
    let app = memory_app().await;
    let uri = "/admin/best-clients?start=2020-08-10&end=2020-08-15";

    let (status, _) = json_request(&app, "GET", uri, &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = json_request(&app, "GET", uri, &[("admin_key", "wrong")], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = [("admin_key", ADMIN_KEY)];
    for bad in [
        "/admin/best-clients?start=2020-08-10",
        "/admin/best-clients?start=2020-08-16&end=2020-08-15",
        "/admin/best-clients?start=yesterday&end=2020-08-15",
        "/admin/best-clients?start=2020-08-10&end=2020-08-15&limit=0",
        "/admin/best-clients?start=2020-08-10&end=2020-08-15&limit=many",
    ] {
        let (status, _) = json_request(&app, "GET", bad, &admin, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
    }

    let closed = create_router(AppState::new(common::memory_store().await, None));
    let (status, _) = json_request(&closed, "GET", uri, &admin, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = json_request(&closed, "GET", uri, &[], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body["error"].as_str().unwrap().contains("admin_key"));
}

#[tokio::test]
async fn test_health() {
    let app = memory_app().await;
    let (status, body) = json_request(&app, "GET", "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_sqlite_backed_router() {
    let (_dir, store) = common::sqlite_store().await;
    let app = create_router(AppState::new(store, Some(ADMIN_KEY.to_string())));

    let (status, body) = json_request(&app, "POST", "/jobs/5/pay", &[("profile_id", "4")], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient balance");

    let (status, body) = json_request(
        &app,
        "POST",
        "/balances/deposit/4",
        &[("profile_id", "4")],
        Some(json!({ "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "51.30");

    let (status, body) = json_request(&app, "GET", "/contracts/7", &[("profile_id", "4")], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contractor"]["lastName"], "Turing");
}

//! Common test utilities for marketplace integration tests

use std::sync::Arc;

use axum_test::TestServer;
use motormarket::crypto::hash_password;
use motormarket::store::{AccountId, NewAccount, Role};
use motormarket::{
    routes, AccountStore, AppState, InMemoryAccountStore, InMemoryCatalogStore,
    InMemorySessionStore,
};
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@market.test";
pub const ADMIN_PASSWORD: &str = "adminpass123";

pub type TestState = AppState<InMemoryAccountStore, InMemoryCatalogStore, InMemorySessionStore>;

/// Create a test server over in-memory stores, with one seeded admin
pub fn create_test_server() -> (TestServer, Arc<TestState>) {
    let accounts = InMemoryAccountStore::new();
    accounts
        .create_account(NewAccount {
            email: ADMIN_EMAIL.to_string(),
            password_hash: Some(hash_password(ADMIN_PASSWORD).expect("bcrypt")),
            name: "Test Admin".to_string(),
            role: Role::Admin,
            verified: true,
            company: None,
            phone: None,
            address: None,
        })
        .expect("Failed to seed admin");

    let state = Arc::new(AppState::new(
        accounts,
        InMemoryCatalogStore::new(),
        InMemorySessionStore::new(),
    ));

    let app = routes::create_router(state.clone());
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, state)
}

/// Register a dealer account, returning its id
pub async fn register_dealer(server: &TestServer, email: &str, password: &str) -> u64 {
    let response = server
        .post("/accounts/register")
        .json(&json!({
            "email": email,
            "password": password,
            "name": "Test Dealer",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    body["account"]["id"].as_u64().expect("No account id")
}

/// Mark a dealer as verified, bypassing the admin endpoint
pub fn verify_account(state: &TestState, id: u64) {
    state
        .accounts
        .set_verified(AccountId(id), true)
        .expect("Failed to verify account");
}

/// Authenticate and return the session cookie value
pub async fn authenticate(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/accounts/authenticate")
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie("market_session")
        .expect("No session cookie")
        .value()
        .to_string()
}

/// Register, verify, and sign in a dealer in one step
pub async fn signed_in_dealer(
    server: &TestServer,
    state: &TestState,
    email: &str,
) -> (u64, String) {
    let id = register_dealer(server, email, "dealerpass123").await;
    verify_account(state, id);
    let session = authenticate(server, email, "dealerpass123").await;
    (id, session)
}

/// Create a listing as the given dealer session, returning its id
pub async fn create_listing(server: &TestServer, session: &str, make: &str, model: &str) -> u64 {
    create_listing_with(server, session, make, model, 2020, 25_000, 30_000).await
}

/// Create a listing with explicit year, price, and mileage
pub async fn create_listing_with(
    server: &TestServer,
    session: &str,
    make: &str,
    model: &str,
    year: i32,
    price: i64,
    mileage: i64,
) -> u64 {
    let response = server
        .post("/listings")
        .add_cookie(cookie::Cookie::new("market_session", session.to_string()))
        .json(&json!({
            "make": make,
            "model": model,
            "year": year,
            "price": price,
            "mileage": mileage,
            "location": "Springfield",
            "transmission": "automatic",
            "fuelType": "petrol",
            "description": "Well maintained",
            "images": ["img-1.jpg"],
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    body["listing"]["id"].as_u64().expect("No listing id")
}

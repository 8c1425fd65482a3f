//! Tests for the admin moderation surface

mod common;

use common::{
    authenticate, create_listing, create_test_server, register_dealer, signed_in_dealer,
    ADMIN_EMAIL, ADMIN_PASSWORD,
};
use serde_json::{json, Value};

/// Test: the admin surface rejects anonymous and dealer callers
#[tokio::test]
async fn test_admin_requires_admin_role() {
    let (server, state) = create_test_server();

    let response = server.get("/admin/accounts").await;
    assert_eq!(response.status_code(), 401);

    let (_, dealer) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let response = server
        .get("/admin/accounts")
        .add_cookie(cookie::Cookie::new("market_session", dealer))
        .await;
    assert_eq!(response.status_code(), 403);
}

/// Test: account listing supports a role filter
#[tokio::test]
async fn test_list_accounts_role_filter() {
    let (server, _) = create_test_server();
    register_dealer(&server, "one@example.com", "dealerpass123").await;
    register_dealer(&server, "two@example.com", "dealerpass123").await;
    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let body: Value = server
        .get("/admin/accounts")
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .await
        .json();
    assert_eq!(body["total"], 3);

    let body: Value = server
        .get("/admin/accounts")
        .add_query_param("role", "dealer")
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .await
        .json();
    assert_eq!(body["total"], 2);

    let response = server
        .get("/admin/accounts")
        .add_query_param("role", "superuser")
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: verification flips a dealer's public visibility
#[tokio::test]
async fn test_verification_controls_visibility() {
    let (server, _) = create_test_server();
    let dealer_id = register_dealer(&server, "dealer@example.com", "dealerpass123").await;
    let dealer = authenticate(&server, "dealer@example.com", "dealerpass123").await;
    create_listing(&server, &dealer, "Toyota", "Corolla").await;

    let body: Value = server.get("/listings").await.json();
    assert_eq!(body["total"], 0);

    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let response = server
        .post(&format!("/admin/accounts/{dealer_id}/verify"))
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .json(&json!({ "verified": true }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = server.get("/listings").await.json();
    assert_eq!(body["total"], 1);

    // Revoking hides the inventory again
    server
        .post(&format!("/admin/accounts/{dealer_id}/verify"))
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .json(&json!({ "verified": false }))
        .await;
    let body: Value = server.get("/listings").await.json();
    assert_eq!(body["total"], 0);
}

/// Test: deleting a dealer removes their listings and engagement data
#[tokio::test]
async fn test_delete_account_cascades() {
    let (server, state) = create_test_server();
    let (dealer_id, dealer) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let listing = create_listing(&server, &dealer, "Toyota", "Corolla").await;
    server.post(&format!("/listings/{listing}/view")).await;

    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let response = server
        .delete(&format!("/admin/accounts/{dealer_id}"))
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server.get(&format!("/listings/{listing}")).await;
    assert_eq!(response.status_code(), 404);

    let body: Value = server
        .get("/admin/events")
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .await
        .json();
    assert_eq!(body["total"], 0);

    // The dealer's session degrades to logged out rather than erroring
    let body: Value = server
        .get("/session/context")
        .add_cookie(cookie::Cookie::new("market_session", dealer))
        .await
        .json();
    assert_eq!(body["authenticated"], false);
}

/// Test: an admin cannot delete their own account
#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let (server, _) = create_test_server();
    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let body: Value = server
        .get("/session/context")
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .await
        .json();
    let admin_id = body["accountId"].as_u64().unwrap();

    let response = server
        .delete(&format!("/admin/accounts/{admin_id}"))
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .await;
    assert_eq!(response.status_code(), 422);
}

/// Test: admin sees every status and can force transitions
#[tokio::test]
async fn test_admin_listing_moderation() {
    let (server, state) = create_test_server();
    let (_, dealer) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let a = create_listing(&server, &dealer, "Toyota", "Corolla").await;
    let b = create_listing(&server, &dealer, "Honda", "Civic").await;
    server
        .patch(&format!("/listings/{b}"))
        .add_cookie(cookie::Cookie::new("market_session", dealer))
        .json(&json!({ "status": "SOLD" }))
        .await;

    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let body: Value = server
        .get("/admin/listings")
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .await
        .json();
    assert_eq!(body["total"], 2);

    let body: Value = server
        .get("/admin/listings")
        .add_query_param("status", "SOLD")
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .await
        .json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["listings"][0]["id"], b);

    // Admin satisfies the ownership check, the state machine still applies
    let response = server
        .patch(&format!("/admin/listings/{a}"))
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .json(&json!({ "status": "UNAVAILABLE" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .patch(&format!("/admin/listings/{b}"))
        .add_cookie(cookie::Cookie::new("market_session", admin.clone()))
        .json(&json!({ "status": "UNAVAILABLE" }))
        .await;
    assert_eq!(response.status_code(), 422);

    let response = server
        .delete(&format!("/admin/listings/{a}"))
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .await;
    assert_eq!(response.status_code(), 200);
    let response = server.get(&format!("/listings/{a}")).await;
    assert_eq!(response.status_code(), 404);
}

/// Test: the event log records attribution and paginates
#[tokio::test]
async fn test_event_log() {
    let (server, state) = create_test_server();
    let (_, dealer) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let listing = create_listing(&server, &dealer, "Toyota", "Corolla").await;

    server
        .post(&format!("/listings/{listing}/view"))
        .json(&json!({ "sessionToken": "visitor-abc" }))
        .await;
    server
        .post(&format!("/listings/{listing}/inquiry"))
        .json(&json!({ "sessionToken": "visitor-abc" }))
        .await;

    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let body: Value = server
        .get("/admin/events")
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .await
        .json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["events"][0]["kind"], "view");
    assert_eq!(body["events"][1]["kind"], "inquiry");
    assert_eq!(body["events"][0]["sessionToken"], "visitor-abc");
    assert_eq!(body["events"][0]["listingId"], listing);
}

/// Test: stats aggregate listing counters
#[tokio::test]
async fn test_stats() {
    let (server, state) = create_test_server();
    let (_, dealer) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let listing = create_listing(&server, &dealer, "Toyota", "Corolla").await;

    for _ in 0..3 {
        server.post(&format!("/listings/{listing}/view")).await;
    }
    server.post(&format!("/listings/{listing}/inquiry")).await;
    server
        .post("/favorites")
        .json(&json!({
            "listingId": listing,
            "sessionToken": "visitor-abc",
            "action": "add",
        }))
        .await;

    let admin = authenticate(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let body: Value = server
        .get("/admin/stats")
        .add_cookie(cookie::Cookie::new("market_session", admin))
        .await
        .json();
    assert_eq!(body["accounts"], 2);
    assert_eq!(body["listings"], 1);
    assert_eq!(body["views"], 3);
    assert_eq!(body["inquiries"], 1);
    assert_eq!(body["favorites"], 1);
}

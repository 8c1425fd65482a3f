//! Tests for view/inquiry recording and favorite toggles

mod common;

use common::{create_listing, create_test_server, signed_in_dealer};
use serde_json::{json, Value};

/// Test: a view without a token mints one, and the count starts at 1
#[tokio::test]
async fn test_view_mints_token() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &session, "Toyota", "Corolla").await;

    let response = server.post(&format!("/listings/{id}/view")).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["viewCount"], 1);
    assert!(body["sessionToken"].as_str().is_some_and(|t| !t.is_empty()));
}

/// Test: repeat views from the same visitor all count
#[tokio::test]
async fn test_views_are_not_deduplicated() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &session, "Toyota", "Corolla").await;

    for expected in 1..=3 {
        let body: Value = server
            .post(&format!("/listings/{id}/view"))
            .json(&json!({ "sessionToken": "visitor-abc" }))
            .await
            .json();
        assert_eq!(body["viewCount"], expected);
        assert_eq!(body["sessionToken"], "visitor-abc");
    }
}

/// Test: inquiries track separately from views
#[tokio::test]
async fn test_inquiry_count() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &session, "Toyota", "Corolla").await;

    server.post(&format!("/listings/{id}/view")).await;

    let body: Value = server
        .post(&format!("/listings/{id}/inquiry"))
        .json(&json!({ "sessionToken": "visitor-abc" }))
        .await
        .json();
    assert_eq!(body["inquiryCount"], 1);

    let body: Value = server.get(&format!("/listings/{id}")).await.json();
    assert_eq!(body["listing"]["viewCount"], 1);
    assert_eq!(body["listing"]["inquiryCount"], 1);
}

/// Test: engagement against a missing listing is a 404
#[tokio::test]
async fn test_view_missing_listing() {
    let (server, _) = create_test_server();

    let response = server.post("/listings/999/view").await;
    assert_eq!(response.status_code(), 404);
}

/// Test: adding the same favorite twice counts once
#[tokio::test]
async fn test_favorite_add_is_idempotent() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &session, "Toyota", "Corolla").await;

    for _ in 0..2 {
        let body: Value = server
            .post("/favorites")
            .json(&json!({
                "listingId": id,
                "sessionToken": "visitor-abc",
                "action": "add",
            }))
            .await
            .json();
        assert_eq!(body["favorited"], true);
    }

    let body: Value = server.get(&format!("/listings/{id}")).await.json();
    assert_eq!(body["listing"]["favoriteCount"], 1);
}

/// Test: removing an absent favorite is a no-op, not an error
#[tokio::test]
async fn test_favorite_remove_is_idempotent() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &session, "Toyota", "Corolla").await;

    let body: Value = server
        .post("/favorites")
        .json(&json!({
            "listingId": id,
            "sessionToken": "visitor-abc",
            "action": "remove",
        }))
        .await
        .json();
    assert_eq!(body["favorited"], false);

    let body: Value = server.get(&format!("/listings/{id}")).await.json();
    assert_eq!(body["listing"]["favoriteCount"], 0);
}

/// Test: an anonymous favorite without a token mints one
#[tokio::test]
async fn test_favorite_mints_token() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &session, "Toyota", "Corolla").await;

    let body: Value = server
        .post("/favorites")
        .json(&json!({ "listingId": id, "action": "add" }))
        .await
        .json();
    assert_eq!(body["favorited"], true);
    let token = body["sessionToken"].as_str().unwrap().to_string();

    let body: Value = server
        .get("/favorites")
        .add_query_param("sessionToken", token)
        .await
        .json();
    assert_eq!(body["listingIds"], json!([id]));
}

/// Test: an authenticated caller's favorite binds to the account, not
/// any visitor token they still carry
#[tokio::test]
async fn test_authenticated_favorite_wins_over_token() {
    let (server, state) = create_test_server();
    let (_, dealer) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let id = create_listing(&server, &dealer, "Toyota", "Corolla").await;

    let (_, buyer) = signed_in_dealer(&server, &state, "buyer@example.com").await;

    let body: Value = server
        .post("/favorites")
        .add_cookie(cookie::Cookie::new("market_session", buyer.clone()))
        .json(&json!({
            "listingId": id,
            "sessionToken": "stale-visitor-token",
            "action": "add",
        }))
        .await
        .json();
    assert_eq!(body["favorited"], true);
    // No token echoed for authenticated callers
    assert!(body.get("sessionToken").is_none());

    let body: Value = server
        .get("/favorites")
        .add_cookie(cookie::Cookie::new("market_session", buyer))
        .await
        .json();
    assert_eq!(body["listingIds"], json!([id]));

    let body: Value = server
        .get("/favorites")
        .add_query_param("sessionToken", "stale-visitor-token")
        .await
        .json();
    assert_eq!(body["listingIds"], json!([]));
}

/// Test: anonymous favorite listing requires a token
#[tokio::test]
async fn test_anonymous_favorites_require_token() {
    let (server, _) = create_test_server();

    let response = server.get("/favorites").await;
    assert_eq!(response.status_code(), 400);
}

/// Test: favoriting a missing listing is a 404
#[tokio::test]
async fn test_favorite_missing_listing() {
    let (server, _) = create_test_server();

    let response = server
        .post("/favorites")
        .json(&json!({
            "listingId": 999,
            "sessionToken": "visitor-abc",
            "action": "add",
        }))
        .await;
    assert_eq!(response.status_code(), 404);
}

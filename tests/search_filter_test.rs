//! Tests for the public search feed: filtering, sorting, pagination

mod common;

use common::{
    create_listing, create_listing_with, create_test_server, register_dealer, signed_in_dealer,
};
use serde_json::{json, Value};

async fn feed(server: &axum_test::TestServer, params: &[(&str, &str)]) -> Value {
    let mut request = server.get("/listings");
    for (key, value) in params {
        request = request.add_query_param(key, value.to_string());
    }
    let response = request.await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

fn prices(body: &Value) -> Vec<i64> {
    body["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["price"].as_i64().unwrap())
        .collect()
}

/// Test: only AVAILABLE listings of verified dealers surface publicly
#[tokio::test]
async fn test_feed_hides_unverified_and_non_available() {
    let (server, state) = create_test_server();

    let (_, verified) = signed_in_dealer(&server, &state, "verified@example.com").await;
    let shown = create_listing(&server, &verified, "Toyota", "Corolla").await;
    let sold = create_listing(&server, &verified, "Honda", "Civic").await;
    server
        .patch(&format!("/listings/{sold}"))
        .add_cookie(cookie::Cookie::new("market_session", verified))
        .json(&json!({ "status": "SOLD" }))
        .await;

    // An unverified dealer's inventory stays invisible
    register_dealer(&server, "unverified@example.com", "dealerpass123").await;
    let session = common::authenticate(&server, "unverified@example.com", "dealerpass123").await;
    create_listing(&server, &session, "Ford", "Focus").await;

    let body = feed(&server, &[]).await;
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["id"], shown);
    assert_eq!(body["total"], 1);
}

/// Test: filters compose conjunctively and the sort applies after them
#[tokio::test]
async fn test_make_price_filter_with_sort() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;

    create_listing_with(&server, &session, "Toyota", "Corolla", 2018, 15_000, 60_000).await;
    create_listing_with(&server, &session, "Toyota", "Camry", 2020, 24_000, 30_000).await;
    create_listing_with(&server, &session, "Toyota", "Yaris", 2019, 12_000, 45_000).await;
    create_listing_with(&server, &session, "Toyota", "Land Cruiser", 2021, 80_000, 10_000).await;
    create_listing_with(&server, &session, "Honda", "Civic", 2019, 14_000, 50_000).await;

    let body = feed(
        &server,
        &[("make", "Toyota"), ("maxPrice", "30000"), ("sort", "price-low")],
    )
    .await;
    assert_eq!(body["total"], 3);
    assert_eq!(prices(&body), vec![12_000, 15_000, 24_000]);
}

/// Test: free-text q matches make and model case-insensitively
#[tokio::test]
async fn test_free_text_search() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    create_listing(&server, &session, "Toyota", "Corolla").await;
    create_listing(&server, &session, "Honda", "Civic").await;

    let body = feed(&server, &[("q", "corol")]).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["listings"][0]["model"], "Corolla");

    let body = feed(&server, &[("q", "HONDA")]).await;
    assert_eq!(body["total"], 1);
}

/// Test: year range bounds are inclusive
#[tokio::test]
async fn test_year_range() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    create_listing_with(&server, &session, "Toyota", "Corolla", 2017, 10_000, 80_000).await;
    create_listing_with(&server, &session, "Toyota", "Camry", 2019, 20_000, 40_000).await;
    create_listing_with(&server, &session, "Toyota", "Yaris", 2022, 22_000, 5_000).await;

    let body = feed(&server, &[("minYear", "2019"), ("maxYear", "2022")]).await;
    assert_eq!(body["total"], 2);
}

/// Test: sort orders
#[tokio::test]
async fn test_sort_orders() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    let cheap = create_listing_with(&server, &session, "Toyota", "Yaris", 2019, 12_000, 45_000).await;
    let dear = create_listing_with(&server, &session, "Toyota", "Camry", 2021, 24_000, 5_000).await;

    let body = feed(&server, &[("sort", "price-high")]).await;
    assert_eq!(prices(&body), vec![24_000, 12_000]);

    let body = feed(&server, &[("sort", "year-new")]).await;
    assert_eq!(body["listings"][0]["id"], dear);

    let body = feed(&server, &[("sort", "mileage-low")]).await;
    assert_eq!(body["listings"][0]["id"], dear);

    // Featured is the default: most viewed first
    for _ in 0..3 {
        server.post(&format!("/listings/{cheap}/view")).await;
    }
    let body = feed(&server, &[]).await;
    assert_eq!(body["listings"][0]["id"], cheap);
}

/// Test: an unknown sort name is rejected
#[tokio::test]
async fn test_unknown_sort_rejected() {
    let (server, _) = create_test_server();

    let response = server
        .get("/listings")
        .add_query_param("sort", "alphabetical")
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: pagination reports totals across pages
#[tokio::test]
async fn test_pagination() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    for i in 0..5 {
        create_listing_with(&server, &session, "Toyota", "Corolla", 2020, 10_000 + i, 30_000)
            .await;
    }

    let body = feed(&server, &[("limit", "2"), ("page", "1"), ("sort", "price-low")]).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["pageCount"], 3);
    assert_eq!(prices(&body), vec![10_000, 10_001]);

    let body = feed(&server, &[("limit", "2"), ("page", "3"), ("sort", "price-low")]).await;
    assert_eq!(prices(&body), vec![10_004]);

    // Past the end is empty, not an error
    let body = feed(&server, &[("limit", "2"), ("page", "9")]).await;
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);

    // Even the largest representable page number is just an empty page
    let body = feed(
        &server,
        &[("limit", "2"), ("page", &usize::MAX.to_string())],
    )
    .await;
    assert_eq!(body["listings"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 5);
}

/// Test: dealerId narrows the feed to one dealer
#[tokio::test]
async fn test_dealer_filter() {
    let (server, state) = create_test_server();
    let (a, session_a) = signed_in_dealer(&server, &state, "a@example.com").await;
    let (_, session_b) = signed_in_dealer(&server, &state, "b@example.com").await;
    create_listing(&server, &session_a, "Toyota", "Corolla").await;
    create_listing(&server, &session_b, "Honda", "Civic").await;

    let body = feed(&server, &[("dealerId", &a.to_string())]).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["listings"][0]["dealerId"], a);
}

/// Test: categorical filters ignore case
#[tokio::test]
async fn test_categorical_filters() {
    let (server, state) = create_test_server();
    let (_, session) = signed_in_dealer(&server, &state, "dealer@example.com").await;
    create_listing(&server, &session, "Toyota", "Corolla").await;

    let body = feed(&server, &[("transmission", "AUTOMATIC"), ("fuelType", "Petrol")]).await;
    assert_eq!(body["total"], 1);

    let body = feed(&server, &[("transmission", "manual")]).await;
    assert_eq!(body["total"], 0);
}

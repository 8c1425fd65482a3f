//! Engagement tracking: views, inquiries, and favorite toggles
//!
//! Views and inquiries are raw frequency signals; every call is recorded.
//! Favorites are a toggle, idempotent in both directions.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::crypto::generate_session_token;
use crate::error::MarketError;
use crate::state::AppState;
use crate::store::{
    AccountStore, CatalogStore, EngagementKind, FavoriteAction, Identity, ListingId, SessionStore,
    SessionToken,
};

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngagementRequest {
    pub session_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub success: bool,
    /// Echoed back, or freshly minted; the caller persists it
    pub session_token: String,
    pub view_count: u64,
}

/// POST /listings/{id}/view
pub async fn record_view<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    Path(id): Path<u64>,
    body: Option<Json<EngagementRequest>>,
) -> Result<Json<ViewResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let token = extract_token(body);
    let count = state
        .catalog
        .record_event(ListingId(id), EngagementKind::View, &token)?;

    Ok(Json(ViewResponse {
        success: true,
        session_token: token.0,
        view_count: count,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryResponse {
    pub success: bool,
    pub session_token: String,
    pub inquiry_count: u64,
}

/// POST /listings/{id}/inquiry
pub async fn record_inquiry<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    Path(id): Path<u64>,
    body: Option<Json<EngagementRequest>>,
) -> Result<Json<InquiryResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let token = extract_token(body);
    let count = state
        .catalog
        .record_event(ListingId(id), EngagementKind::Inquiry, &token)?;

    Ok(Json(InquiryResponse {
        success: true,
        session_token: token.0,
        inquiry_count: count,
    }))
}

fn extract_token(body: Option<Json<EngagementRequest>>) -> SessionToken {
    let provided = body.and_then(|Json(req)| req.session_token);
    SessionToken(provided.unwrap_or_else(generate_session_token))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub listing_id: u64,
    #[serde(default)]
    pub session_token: Option<String>,
    pub action: FavoriteAction,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub success: bool,
    /// Resulting state, so the client can reconcile optimistic UI
    pub favorited: bool,
    /// Present only for anonymous callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// POST /favorites
pub async fn toggle_favorite<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Json(req): Json<FavoriteRequest>,
) -> Result<Json<FavoriteResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    // The authenticated account wins over any supplied visitor token
    let resolved = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?;

    let (identity, session_token) = match resolved {
        Some((_, account)) => (Identity::Account(account.id), None),
        None => {
            let token = req.session_token.unwrap_or_else(generate_session_token);
            (
                Identity::Visitor(SessionToken(token.clone())),
                Some(token),
            )
        }
    };

    let favorited =
        state
            .catalog
            .toggle_favorite(&identity, ListingId(req.listing_id), req.action)?;

    Ok(Json(FavoriteResponse {
        success: true,
        favorited,
        session_token,
    }))
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FavoritesQuery {
    pub session_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesResponse {
    pub success: bool,
    pub listing_ids: Vec<u64>,
}

/// GET /favorites
pub async fn list_favorites<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Query(query): Query<FavoritesQuery>,
) -> Result<Json<FavoritesResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let resolved = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?;

    let identity = match resolved {
        Some((_, account)) => Identity::Account(account.id),
        None => {
            let token = query.session_token.ok_or_else(|| {
                MarketError::Validation("sessionToken required for anonymous callers".to_string())
            })?;
            Identity::Visitor(SessionToken(token))
        }
    };

    let ids = state.catalog.favorites_for(&identity)?;

    Ok(Json(FavoritesResponse {
        success: true,
        listing_ids: ids.into_iter().map(|id| id.0).collect(),
    }))
}

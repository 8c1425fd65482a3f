//! Admin moderation gateway
//!
//! Read access across all dealers' data plus privileged writes. Every
//! mutation is logged with the acting admin's id for attribution.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::auth::{authorize, Action};
use crate::error::MarketError;
use crate::state::AppState;
use crate::store::{
    Account, AccountId, AccountStore, CatalogStore, ListingId, ListingStatus, Role, SessionStore,
};

use super::accounts::AccountBody;
use super::listings::{DeleteResponse, ListingBody, ListingResponse};

/// Resolve the caller and require the ADMIN role
fn require_admin<A, C, S>(
    cookies: &Cookies,
    state: &AppState<A, C, S>,
) -> Result<Account, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let account = super::session::resolve_account(cookies, &state.accounts, &state.sessions)?
        .map(|(_, account)| account)
        .ok_or(MarketError::Unauthorized)?;
    authorize(Some(&account), Action::Admin)?;
    Ok(account)
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsPage {
    pub success: bool,
    pub accounts: Vec<AccountBody>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// GET /admin/accounts
pub async fn list_accounts<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<AccountsPage>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    require_admin(&cookies, &state)?;

    let role = match &query.role {
        None => None,
        Some(r) => Some(
            Role::from_str(r)
                .ok_or_else(|| MarketError::Validation(format!("unknown role '{r}'")))?,
        ),
    };

    let accounts: Vec<Account> = state
        .accounts
        .list_accounts()?
        .into_iter()
        .filter(|a| role.is_none_or(|r| a.role == r))
        .collect();

    let (page, limit) = super::page_params(query.page, query.limit);
    let (accounts, total, page_count) = super::paginate(accounts, page, limit);

    Ok(Json(AccountsPage {
        success: true,
        accounts: accounts.iter().map(AccountBody::from).collect(),
        total,
        page,
        page_count,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsPage {
    pub success: bool,
    pub listings: Vec<ListingBody>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// GET /admin/listings
/// All dealers, all statuses
pub async fn list_listings<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<ListingsPage>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    require_admin(&cookies, &state)?;

    let status = match &query.status {
        None => None,
        Some(s) => Some(
            ListingStatus::from_str(s)
                .ok_or_else(|| MarketError::Validation(format!("unknown status '{s}'")))?,
        ),
    };

    let listings: Vec<_> = state
        .catalog
        .list_listings()?
        .into_iter()
        .filter(|l| status.is_none_or(|s| l.status == s))
        .collect();

    let (page, limit) = super::page_params(query.page, query.limit);
    let (listings, total, page_count) = super::paginate(listings, page, limit);

    Ok(Json(ListingsPage {
        success: true,
        listings: listings.iter().map(ListingBody::from).collect(),
        total,
        page,
        page_count,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub id: u64,
    pub listing_id: u64,
    pub kind: &'static str,
    pub session_token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    pub success: bool,
    pub events: Vec<EventBody>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// GET /admin/events
/// All engagement activity, oldest first
pub async fn list_events<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<EventsPage>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    require_admin(&cookies, &state)?;

    let events = state.catalog.list_events()?;
    let (page, limit) = super::page_params(query.page, query.limit);
    let (events, total, page_count) = super::paginate(events, page, limit);

    Ok(Json(EventsPage {
        success: true,
        events: events
            .iter()
            .map(|e| EventBody {
                id: e.id.0,
                listing_id: e.listing_id.0,
                kind: e.kind.as_str(),
                session_token: e.session_token.0.clone(),
                created_at: e.created_at,
            })
            .collect(),
        total,
        page,
        page_count,
    }))
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub accounts: usize,
    pub listings: usize,
    pub views: u64,
    pub inquiries: u64,
    pub favorites: u64,
}

/// GET /admin/stats
pub async fn stats<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
) -> Result<Json<StatsResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    require_admin(&cookies, &state)?;

    let accounts = state.accounts.list_accounts()?.len();
    let listings = state.catalog.list_listings()?;

    Ok(Json(StatsResponse {
        success: true,
        accounts,
        listings: listings.len(),
        views: listings.iter().map(|l| l.view_count).sum(),
        inquiries: listings.iter().map(|l| l.inquiry_count).sum(),
        favorites: listings.iter().map(|l| l.favorite_count).sum(),
    }))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub verified: bool,
}

/// POST /admin/accounts/{id}/verify
pub async fn set_verified<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let admin = require_admin(&cookies, &state)?;

    state.accounts.set_verified(AccountId(id), req.verified)?;

    tracing::info!(
        account = id,
        verified = req.verified,
        admin = admin.id.0,
        "Dealer verification changed"
    );

    Ok(Json(VerifyResponse {
        success: true,
        verified: req.verified,
    }))
}

/// DELETE /admin/accounts/{id}
/// Cascades the account's listings, and through them all engagement data
pub async fn delete_account<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let admin = require_admin(&cookies, &state)?;
    let target = AccountId(id);
    authorize(Some(&admin), Action::DeleteAccount { target })?;

    if state.accounts.get_account(target)?.is_none() {
        return Err(MarketError::NotFound);
    }

    for listing in state.catalog.listings_by_dealer(target)? {
        state.catalog.delete_listing(listing.id)?;
    }
    state.accounts.delete_account(target)?;

    tracing::info!(account = id, admin = admin.id.0, "Account deleted");

    Ok(Json(DeleteResponse { success: true }))
}

/// PATCH /admin/listings/{id}
/// The ADMIN role satisfies the ownership check implicitly
pub async fn change_status<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(req): Json<super::listings::StatusRequest>,
) -> Result<Json<ListingResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let admin = require_admin(&cookies, &state)?;

    let listing = super::listings::apply_status_transition(
        &state.catalog,
        &admin,
        ListingId(id),
        &req.status,
    )?;

    tracing::info!(
        listing = id,
        status = listing.status.as_str(),
        admin = admin.id.0,
        "Listing status changed by admin"
    );

    Ok(Json(ListingResponse {
        success: true,
        listing: ListingBody::from(&listing),
    }))
}

/// DELETE /admin/listings/{id}
pub async fn delete_listing<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let admin = require_admin(&cookies, &state)?;

    if state.catalog.get_listing(ListingId(id))?.is_none() {
        return Err(MarketError::NotFound);
    }
    state.catalog.delete_listing(ListingId(id))?;

    tracing::info!(listing = id, admin = admin.id.0, "Listing deleted by admin");

    Ok(Json(DeleteResponse { success: true }))
}

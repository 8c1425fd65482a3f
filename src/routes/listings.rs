//! Listing CRUD, status transitions, and the public search feed

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::auth::{authorize, Action};
use crate::error::MarketError;
use crate::search::{sort_listings, ListingQuery};
use crate::state::AppState;
use crate::store::{
    Account, AccountStore, CatalogStore, Listing, ListingId, ListingStatus, ListingUpdate,
    NewListing, SessionStore,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingBody {
    pub id: u64,
    pub dealer_id: u64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub mileage: i64,
    pub location: String,
    pub transmission: String,
    pub fuel_type: String,
    pub description: String,
    pub images: Vec<String>,
    pub status: &'static str,
    pub view_count: u64,
    pub inquiry_count: u64,
    pub favorite_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Listing> for ListingBody {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id.0,
            dealer_id: listing.dealer_id.0,
            make: listing.make.clone(),
            model: listing.model.clone(),
            year: listing.year,
            price: listing.price,
            mileage: listing.mileage,
            location: listing.location.clone(),
            transmission: listing.transmission.clone(),
            fuel_type: listing.fuel_type.clone(),
            description: listing.description.clone(),
            images: listing.images.clone(),
            status: listing.status.as_str(),
            view_count: listing.view_count,
            inquiry_count: listing.inquiry_count,
            favorite_count: listing.favorite_count,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub mileage: i64,
    pub location: String,
    pub transmission: String,
    pub fuel_type: String,
    #[serde(default)]
    pub description: String,
    /// References already hosted by the external image store
    pub images: Vec<String>,
}

#[derive(Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub listing: ListingBody,
}

/// POST /listings
pub async fn create_listing<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Json(req): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<ListingResponse>), MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let account = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?
        .map(|(_, account)| account)
        .ok_or(MarketError::Unauthorized)?;
    authorize(Some(&account), Action::CreateListing)?;

    if req.images.is_empty() {
        return Err(MarketError::Validation(
            "at least one image reference is required".to_string(),
        ));
    }

    let listing = state.catalog.create_listing(NewListing {
        dealer_id: account.id,
        make: req.make,
        model: req.model,
        year: req.year,
        price: req.price,
        mileage: req.mileage,
        location: req.location,
        transmission: req.transmission,
        fuel_type: req.fuel_type,
        description: req.description,
        images: req.images,
    })?;

    tracing::info!(listing = listing.id.0, dealer = account.id.0, "Listing created");

    Ok((
        StatusCode::CREATED,
        Json(ListingResponse {
            success: true,
            listing: ListingBody::from(&listing),
        }),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub listings: Vec<ListingBody>,
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

/// GET /listings
/// Public feed: AVAILABLE listings of verified dealers only
pub async fn search_listings<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<SearchResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let sort = query.sort_key()?;
    let predicates = query.predicates();

    let dealers: HashMap<_, _> = state
        .accounts
        .list_accounts()?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let mut listings: Vec<Listing> = state
        .catalog
        .list_listings()?
        .into_iter()
        .filter(|l| l.status == ListingStatus::Available)
        .filter(|l| {
            // Unverified dealers never surface publicly
            let Some(dealer) = dealers.get(&l.dealer_id) else {
                return false;
            };
            dealer.verified && predicates.iter().all(|p| p(l, dealer))
        })
        .collect();

    sort_listings(&mut listings, sort);

    let (page, limit) = super::page_params(query.page, query.limit);
    let (listings, total, page_count) = super::paginate(listings, page, limit);

    Ok(Json(SearchResponse {
        success: true,
        listings: listings.iter().map(ListingBody::from).collect(),
        total,
        page,
        page_count,
    }))
}

/// GET /listings/{id}
pub async fn get_listing<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    Path(id): Path<u64>,
) -> Result<Json<ListingResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let listing = state
        .catalog
        .get_listing(ListingId(id))?
        .ok_or(MarketError::NotFound)?;

    Ok(Json(ListingResponse {
        success: true,
        listing: ListingBody::from(&listing),
    }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Validate a requested transition and apply it; shared with the admin surface
pub(crate) fn apply_status_transition<C>(
    catalog: &C,
    account: &Account,
    id: ListingId,
    requested: &str,
) -> Result<Listing, MarketError>
where
    C: CatalogStore,
{
    let next = ListingStatus::from_str(requested).ok_or(MarketError::InvalidStatus)?;

    let listing = catalog.get_listing(id)?.ok_or(MarketError::NotFound)?;
    authorize(
        Some(account),
        Action::MutateListing {
            owner: listing.dealer_id,
        },
    )?;

    if !listing.status.can_transition_to(next) {
        return Err(MarketError::InvalidOperation);
    }

    catalog.set_status(id, next)
}

/// PATCH /listings/{id}
pub async fn change_status<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<ListingResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let (_, account) = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?
        .ok_or(MarketError::Unauthorized)?;

    let listing = apply_status_transition(&state.catalog, &account, ListingId(id), &req.status)?;

    tracing::info!(
        listing = listing.id.0,
        status = listing.status.as_str(),
        by = account.id.0,
        "Listing status changed"
    );

    Ok(Json(ListingResponse {
        success: true,
        listing: ListingBody::from(&listing),
    }))
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateListingRequest {
    pub price: Option<i64>,
    pub mileage: Option<i64>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

/// PUT /listings/{id}
pub async fn update_listing<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Path(id): Path<u64>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<Json<ListingResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let (_, account) = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?
        .ok_or(MarketError::Unauthorized)?;

    let listing = state
        .catalog
        .get_listing(ListingId(id))?
        .ok_or(MarketError::NotFound)?;
    authorize(
        Some(&account),
        Action::MutateListing {
            owner: listing.dealer_id,
        },
    )?;

    if matches!(&req.images, Some(images) if images.is_empty()) {
        return Err(MarketError::Validation(
            "at least one image reference is required".to_string(),
        ));
    }

    let listing = state.catalog.update_listing(
        ListingId(id),
        ListingUpdate {
            price: req.price,
            mileage: req.mileage,
            location: req.location,
            description: req.description,
            images: req.images,
        },
    )?;

    Ok(Json(ListingResponse {
        success: true,
        listing: ListingBody::from(&listing),
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// DELETE /listings/{id}
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
    let (_, account) = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?
        .ok_or(MarketError::Unauthorized)?;

    let listing = state
        .catalog
        .get_listing(ListingId(id))?
        .ok_or(MarketError::NotFound)?;
    authorize(
        Some(&account),
        Action::MutateListing {
            owner: listing.dealer_id,
        },
    )?;

    state.catalog.delete_listing(ListingId(id))?;

    tracing::info!(listing = id, by = account.id.0, "Listing deleted");

    Ok(Json(DeleteResponse { success: true }))
}

#[derive(Serialize)]
pub struct DealerListingsResponse {
    pub success: bool,
    pub listings: Vec<ListingBody>,
}

/// GET /dealer/listings
/// The caller's own listings, all statuses
pub async fn dealer_listings<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
) -> Result<Json<DealerListingsResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let account = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?
        .map(|(_, account)| account)
        .ok_or(MarketError::Unauthorized)?;
    authorize(Some(&account), Action::ViewOwnListings)?;

    let listings = state.catalog.listings_by_dealer(account.id)?;

    Ok(Json(DealerListingsResponse {
        success: true,
        listings: listings.iter().map(ListingBody::from).collect(),
    }))
}

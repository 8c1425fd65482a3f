//! HTTP route handlers and router assembly

use std::sync::Arc;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::{AccountStore, CatalogStore, SessionStore};

pub mod accounts;
pub mod admin;
pub mod engagement;
pub mod listings;
pub mod session;

/// Default page size for paginated endpoints
const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on caller-supplied page sizes
const MAX_PAGE_SIZE: usize = 100;

/// Normalize caller-supplied pagination parameters
pub(crate) fn page_params(page: Option<usize>, limit: Option<usize>) -> (usize, usize) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// Slice one page out of an already filtered and sorted list
///
/// Returns the page items, the pre-pagination total, and the page count.
/// A page past the end yields an empty slice, not an error.
pub(crate) fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> (Vec<T>, usize, usize) {
    let total = items.len();
    let page_count = total.div_ceil(limit).max(1);
    // Saturate: an absurd caller-supplied page is an empty page, not an overflow
    let page_items = items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();
    (page_items, total, page_count)
}

/// Build the application router over any store backend combination
pub fn create_router<A, C, S>(state: Arc<AppState<A, C, S>>) -> Router
where
    A: AccountStore + 'static,
    C: CatalogStore + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/session/context", get(session::get_session_context))
        .route("/accounts/register", post(accounts::register))
        .route("/accounts/authenticate", post(accounts::authenticate))
        .route("/accounts/delegated", post(accounts::authenticate_delegated))
        .route("/accounts/logout", post(accounts::logout))
        .route("/accounts/profile", put(accounts::update_profile))
        .route(
            "/listings",
            post(listings::create_listing).get(listings::search_listings),
        )
        .route(
            "/listings/{id}",
            get(listings::get_listing)
                .patch(listings::change_status)
                .put(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route("/listings/{id}/view", post(engagement::record_view))
        .route("/listings/{id}/inquiry", post(engagement::record_inquiry))
        .route(
            "/favorites",
            post(engagement::toggle_favorite).get(engagement::list_favorites),
        )
        .route("/dealer/listings", get(listings::dealer_listings))
        .route("/admin/accounts", get(admin::list_accounts))
        .route("/admin/accounts/{id}/verify", post(admin::set_verified))
        .route("/admin/accounts/{id}", delete(admin::delete_account))
        .route("/admin/listings", get(admin::list_listings))
        .route(
            "/admin/listings/{id}",
            patch(admin::change_status).delete(admin::delete_listing),
        )
        .route("/admin/events", get(admin::list_events))
        .route("/admin/stats", get(admin::stats))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Session identity resolution
//!
//! Anonymous visitors are identified by an opaque token they hold client-side;
//! authenticated callers by an HttpOnly session cookie. Every use of the
//! cookie revalidates that the referenced account still exists.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::crypto::generate_session_token;
use crate::state::AppState;
use crate::store::{
    Account, AccountId, AccountStore, CatalogStore, Identity, Session, SessionId, SessionStore,
    SessionToken, StoreResult,
};

const SESSION_COOKIE: &str = "market_session";

/// Resolve the authenticated account behind the session cookie, if any
///
/// A session whose account has been deleted degrades to logged-out: the
/// session is discarded and the cookie cleared, never surfaced as an error.
pub fn resolve_account<A, S>(
    cookies: &Cookies,
    accounts: &A,
    sessions: &S,
) -> StoreResult<Option<(Session, Account)>>
where
    A: AccountStore,
    S: SessionStore,
{
    let Some(cookie) = cookies.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let session_id = SessionId(cookie.value().to_string());

    let Some(session) = sessions.get_session(&session_id)? else {
        clear_session_cookie(cookies);
        return Ok(None);
    };

    match accounts.get_account(session.account_id)? {
        Some(account) => Ok(Some((session, account))),
        None => {
            tracing::info!(
                account = session.account_id.0,
                "Session references a deleted account, treating as logged out"
            );
            sessions.delete_session(&session_id)?;
            clear_session_cookie(cookies);
            Ok(None)
        }
    }
}

/// Best-effort union-merge of a visitor's favorites into an account's
///
/// Runs once at sign-in. A partial merge is tolerated; failure never blocks
/// authentication.
pub fn reconcile_favorites<C>(catalog: &C, token: &str, account_id: AccountId) -> usize
where
    C: CatalogStore,
{
    let from = Identity::Visitor(SessionToken(token.to_string()));
    let into = Identity::Account(account_id);
    match catalog.merge_favorites(&from, &into) {
        Ok(merged) => {
            if merged > 0 {
                tracing::info!(account = account_id.0, merged, "Reconciled visitor favorites");
            }
            merged
        }
        Err(e) => {
            tracing::warn!(account = account_id.0, "Favorite reconciliation failed: {}", e);
            0
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionContextQuery {
    pub session_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
    /// Echoed back, or freshly minted when the caller supplied none; the
    /// client persists it for attributing views, inquiries, and favorites
    pub session_token: String,
    pub server_time: i64,
}

/// GET /session/context
pub async fn get_session_context<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Query(query): Query<SessionContextQuery>,
) -> Json<SessionContext>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let resolved = resolve_account(&cookies, &state.accounts, &state.sessions)
        .ok()
        .flatten();

    let session_token = query
        .session_token
        .unwrap_or_else(generate_session_token);

    let context = if let Some((session, account)) = resolved {
        SessionContext {
            authenticated: true,
            account_id: Some(account.id.0),
            role: Some(account.role.as_str()),
            csrf_token: Some(session.csrf_token),
            session_token,
            server_time: chrono::Utc::now().timestamp(),
        }
    } else {
        SessionContext {
            authenticated: false,
            account_id: None,
            role: None,
            csrf_token: None,
            session_token,
            server_time: chrono::Utc::now().timestamp(),
        }
    };

    Json(context)
}

/// Helper to set the session cookie
pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    use tower_cookies::Cookie;
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

/// Helper to clear the session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    use tower_cookies::Cookie;
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}

//! Account registration and authentication endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::crypto::{hash_password, verify_password};
use crate::error::MarketError;
use crate::state::AppState;
use crate::store::{
    Account, AccountStore, CatalogStore, NewAccount, ProfileUpdate, Role, SessionStore,
};

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length
const MAX_PASSWORD_LENGTH: usize = 80;

/// Account fields safe to serialize; the password hash never leaves the store
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBody {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: &'static str,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountBody {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.0,
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role.as_str(),
            verified: account.verified,
            company: account.company.clone(),
            phone: account.phone.clone(),
            address: account.address.clone(),
            created_at: account.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub account: AccountBody,
}

/// POST /accounts/register
/// Dealer self-registration; always created unverified
pub async fn register<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    if !req.email.contains('@') {
        return Err(MarketError::Validation("invalid email address".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LENGTH {
        return Err(MarketError::Validation(format!(
            "password too short (minimum {MIN_PASSWORD_LENGTH} characters)"
        )));
    }
    if req.password.len() > MAX_PASSWORD_LENGTH {
        return Err(MarketError::Validation(format!(
            "password too long (maximum {MAX_PASSWORD_LENGTH} characters)"
        )));
    }

    let password_hash =
        hash_password(&req.password).map_err(|e| MarketError::Internal(e.to_string()))?;

    let account = state.accounts.create_account(NewAccount {
        email: req.email,
        password_hash: Some(password_hash),
        name: req.name,
        role: Role::Dealer,
        verified: false,
        company: req.company,
        phone: req.phone,
        address: req.address,
    })?;

    tracing::info!(account = account.id.0, "Dealer registered");

    Ok(Json(RegisterResponse {
        success: true,
        account: AccountBody::from(&account),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
    /// Anonymous token to reconcile favorites from, if the caller had one
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub success: bool,
    pub account_id: u64,
    pub role: &'static str,
}

/// POST /accounts/authenticate
pub async fn authenticate<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Json(req): Json<AuthenticateRequest>,
) -> Result<Json<AuthenticateResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    // Missing account, passwordless account, and bad password are one error
    let account = state
        .accounts
        .get_account_by_email(&req.email)?
        .ok_or(MarketError::InvalidCredentials)?;

    let hash = account
        .password_hash
        .as_deref()
        .ok_or(MarketError::InvalidCredentials)?;

    let valid =
        verify_password(&req.password, hash).map_err(|e| MarketError::Internal(e.to_string()))?;
    if !valid {
        return Err(MarketError::InvalidCredentials);
    }

    let session = state.sessions.create_session(account.id)?;
    super::session::set_session_cookie(&cookies, &session.id.0);

    if let Some(token) = &req.session_token {
        super::session::reconcile_favorites(&state.catalog, token, account.id);
    }

    Ok(Json(AuthenticateResponse {
        success: true,
        account_id: account.id.0,
        role: account.role.as_str(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedRequest {
    /// Email already verified by the external identity provider
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedResponse {
    pub success: bool,
    pub account_id: u64,
    pub role: &'static str,
    /// Whether a new account was created for this identity
    pub created: bool,
}

/// POST /accounts/delegated
/// Sign in with a verified external identity; creates an unverified,
/// passwordless dealer account on first use
pub async fn authenticate_delegated<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Json(req): Json<DelegatedRequest>,
) -> Result<Json<DelegatedResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let (account, created) = match state.accounts.get_account_by_email(&req.email)? {
        Some(account) => (account, false),
        None => {
            let account = state.accounts.create_account(NewAccount {
                email: req.email.clone(),
                password_hash: None,
                name: req.name,
                role: Role::Dealer,
                verified: false,
                company: None,
                phone: None,
                address: None,
            })?;
            tracing::info!(account = account.id.0, "Account created from delegated identity");
            (account, true)
        }
    };

    state.accounts.link_delegated(account.id, &req.email)?;

    let session = state.sessions.create_session(account.id)?;
    super::session::set_session_cookie(&cookies, &session.id.0);

    if let Some(token) = &req.session_token {
        super::session::reconcile_favorites(&state.catalog, token, account.id);
    }

    Ok(Json(DelegatedResponse {
        success: true,
        account_id: account.id.0,
        role: account.role.as_str(),
        created,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /accounts/logout
pub async fn logout<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
) -> Json<LogoutResponse>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    if let Ok(Some((session, _))) =
        super::session::resolve_account(&cookies, &state.accounts, &state.sessions)
    {
        let _ = state.sessions.delete_session(&session.id);
    }

    super::session::clear_session_cookie(&cookies);

    Json(LogoutResponse { success: true })
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub account: AccountBody,
}

/// PUT /accounts/profile
/// Update the caller's own profile fields
pub async fn update_profile<A, C, S>(
    State(state): State<Arc<AppState<A, C, S>>>,
    cookies: Cookies,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, MarketError>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    let (_, account) = super::session::resolve_account(&cookies, &state.accounts, &state.sessions)?
        .ok_or(MarketError::Unauthorized)?;

    let account = state.accounts.update_profile(account.id, update)?;

    Ok(Json(ProfileResponse {
        success: true,
        account: AccountBody::from(&account),
    }))
}

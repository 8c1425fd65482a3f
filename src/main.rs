//! MotorMarket server
//!
//! Backend for a vehicle marketplace: dealer accounts, listing lifecycle,
//! anonymous engagement tracking, and a composable search feed.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motormarket::store::{NewAccount, Role};
use motormarket::{
    routes, AccountStore, AppState, Config, InMemoryAccountStore, InMemoryCatalogStore,
    InMemorySessionStore, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motormarket=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    // Create router over the configured backend
    let app = match &config.db_path {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path, "Using SQLite store");
            seed_admin(store.as_ref(), &config)?;
            routes::create_router(Arc::new(AppState::new(
                store.clone(),
                store.clone(),
                store,
            )))
        }
        None => {
            tracing::warn!("No MARKET_DB set, using in-memory stores; data will not persist");
            let accounts = InMemoryAccountStore::new();
            seed_admin(&accounts, &config)?;
            routes::create_router(Arc::new(AppState::new(
                accounts,
                InMemoryCatalogStore::new(),
                InMemorySessionStore::new(),
            )))
        }
    };

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Marketplace listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed the bootstrap admin account if configured and not already present
fn seed_admin<A: AccountStore>(accounts: &A, config: &Config) -> Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    if accounts.get_account_by_email(email)?.is_some() {
        return Ok(());
    }

    let hash = motormarket::crypto::hash_password(password)?;
    let admin = accounts.create_account(NewAccount {
        email: email.clone(),
        password_hash: Some(hash),
        name: "Administrator".to_string(),
        role: Role::Admin,
        verified: true,
        company: None,
        phone: None,
        address: None,
    })?;
    tracing::info!(account = admin.id.0, "Seeded admin account");

    Ok(())
}

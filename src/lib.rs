//! MotorMarket
//!
//! Backend for a vehicle marketplace: dealer accounts, listing lifecycle,
//! anonymous engagement tracking, and a composable search feed.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod routes;
pub mod search;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::MarketError;
pub use state::AppState;
pub use store::{
    AccountStore, CatalogStore, InMemoryAccountStore, InMemoryCatalogStore, InMemorySessionStore,
    SessionStore, SqliteStore,
};

//! Shared application state

use crate::store::{AccountStore, CatalogStore, SessionStore};

/// Application state, generic over the store backends
pub struct AppState<A, C, S> {
    pub accounts: A,
    pub catalog: C,
    pub sessions: S,
}

impl<A, C, S> AppState<A, C, S>
where
    A: AccountStore,
    C: CatalogStore,
    S: SessionStore,
{
    pub fn new(accounts: A, catalog: C, sessions: S) -> Self {
        Self {
            accounts,
            catalog,
            sessions,
        }
    }
}

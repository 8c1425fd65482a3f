//! Storage abstractions for the marketplace

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemoryAccountStore, InMemoryCatalogStore, InMemorySessionStore};
pub use models::*;
pub use sqlite::SqliteStore;

use crate::error::MarketError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, MarketError>;

/// Trait for account storage
pub trait AccountStore: Send + Sync {
    /// Create an account; fails with `Conflict` if the email is taken
    fn create_account(&self, new: NewAccount) -> StoreResult<Account>;

    /// Get an account by ID
    fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Get an account by email address (case-insensitive)
    fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Update self-service profile fields; fails with `NotFound` if absent
    fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> StoreResult<Account>;

    /// Set the dealer verification flag
    fn set_verified(&self, id: AccountId, verified: bool) -> StoreResult<()>;

    /// Record a delegated-identity link for an account, if not already present
    fn link_delegated(&self, id: AccountId, email: &str) -> StoreResult<()>;

    /// Delete an account; callers cascade the account's listings first
    fn delete_account(&self, id: AccountId) -> StoreResult<()>;

    /// All accounts, oldest first
    fn list_accounts(&self) -> StoreResult<Vec<Account>>;
}

/// Trait for listing, engagement, and favorite storage
///
/// Engagement lives with the catalog because event creation and the listing
/// counters must move together, and listing deletion cascades to both.
pub trait CatalogStore: Send + Sync {
    fn create_listing(&self, new: NewListing) -> StoreResult<Listing>;

    fn get_listing(&self, id: ListingId) -> StoreResult<Option<Listing>>;

    /// Apply field edits; fails with `NotFound` if absent
    fn update_listing(&self, id: ListingId, update: ListingUpdate) -> StoreResult<Listing>;

    /// Overwrite the status (last-write-wins); machine legality is checked by
    /// the caller against the listing it fetched
    fn set_status(&self, id: ListingId, status: ListingStatus) -> StoreResult<Listing>;

    /// Delete a listing, cascading its engagement events and favorites
    fn delete_listing(&self, id: ListingId) -> StoreResult<()>;

    fn listings_by_dealer(&self, dealer_id: AccountId) -> StoreResult<Vec<Listing>>;

    /// All listings regardless of status, oldest first
    fn list_listings(&self) -> StoreResult<Vec<Listing>>;

    /// Append an engagement event and atomically bump the matching counter;
    /// returns the new counter value. Fails with `NotFound` for a missing
    /// listing. Never deduplicates.
    fn record_event(
        &self,
        id: ListingId,
        kind: EngagementKind,
        token: &SessionToken,
    ) -> StoreResult<u64>;

    /// All engagement events, oldest first
    fn list_events(&self) -> StoreResult<Vec<EngagementEvent>>;

    /// Idempotent favorite toggle; returns the resulting favorited state.
    /// Fails with `NotFound` for a missing listing.
    fn toggle_favorite(
        &self,
        identity: &Identity,
        id: ListingId,
        action: FavoriteAction,
    ) -> StoreResult<bool>;

    /// Listing ids favorited by the given identity
    fn favorites_for(&self, identity: &Identity) -> StoreResult<Vec<ListingId>>;

    /// Union-merge `from`'s favorites into `into`'s, deduplicated by listing
    /// id, skipping listings that no longer exist; the `from` set is cleared.
    /// Returns how many favorites were carried over.
    fn merge_favorites(&self, from: &Identity, into: &Identity) -> StoreResult<usize>;
}

/// Trait for authenticated-session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for an account
    fn create_session(&self, account_id: AccountId) -> StoreResult<Session>;

    /// Get a session by ID
    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete_session(&self, id: &SessionId) -> StoreResult<()>;
}

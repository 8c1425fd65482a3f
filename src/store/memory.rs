//! In-memory storage implementations

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use super::{
    Account, AccountId, AccountStore, CatalogStore, EngagementEvent, EngagementKind, EventId,
    FavoriteAction, Identity, Listing, ListingId, ListingStatus, ListingUpdate, NewAccount,
    NewListing, ProfileUpdate, Session, SessionId, SessionStore, SessionToken, StoreResult,
};
use crate::error::MarketError;

/// In-memory account store
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    /// Delegated-identity links, keyed by normalized email
    delegated: RwLock<HashMap<String, AccountId>>,
    next_account_id: AtomicU64,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            delegated: RwLock::new(HashMap::new()),
            next_account_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn create_account(&self, new: NewAccount) -> StoreResult<Account> {
        let normalized = new.email.to_lowercase();
        let mut accounts = self.accounts.write().unwrap();
        if accounts.values().any(|a| a.email == normalized) {
            return Err(MarketError::Conflict);
        }

        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let account = Account {
            id,
            email: normalized,
            password_hash: new.password_hash,
            name: new.name,
            role: new.role,
            verified: new.verified,
            company: new.company,
            phone: new.phone,
            address: new.address,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(id, account.clone());
        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(&id).cloned())
    }

    fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let normalized = email.to_lowercase();
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.email == normalized)
            .cloned())
    }

    fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> StoreResult<Account> {
        let mut accounts = self.accounts.write().unwrap();
        let account = accounts.get_mut(&id).ok_or(MarketError::NotFound)?;
        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(company) = update.company {
            account.company = Some(company);
        }
        if let Some(phone) = update.phone {
            account.phone = Some(phone);
        }
        if let Some(address) = update.address {
            account.address = Some(address);
        }
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    fn set_verified(&self, id: AccountId, verified: bool) -> StoreResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        let account = accounts.get_mut(&id).ok_or(MarketError::NotFound)?;
        account.verified = verified;
        account.updated_at = Utc::now();
        Ok(())
    }

    fn link_delegated(&self, id: AccountId, email: &str) -> StoreResult<()> {
        let normalized = email.to_lowercase();
        self.delegated.write().unwrap().entry(normalized).or_insert(id);
        Ok(())
    }

    fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.remove(&id).is_none() {
            return Err(MarketError::NotFound);
        }
        self.delegated.write().unwrap().retain(|_, aid| *aid != id);
        Ok(())
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.accounts.read().unwrap().values().cloned().collect();
        accounts.sort_by_key(|a| a.id.0);
        Ok(accounts)
    }
}

/// In-memory listing, engagement, and favorite store
///
/// Counter bumps and favorite toggles run inside the write-lock critical
/// section of the owning map, so concurrent requests cannot lose updates.
pub struct InMemoryCatalogStore {
    listings: RwLock<HashMap<ListingId, Listing>>,
    events: RwLock<Vec<EngagementEvent>>,
    favorites: RwLock<HashSet<(Identity, ListingId)>>,
    next_listing_id: AtomicU64,
    next_event_id: AtomicU64,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
            favorites: RwLock::new(HashSet::new()),
            next_listing_id: AtomicU64::new(1),
            next_event_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn create_listing(&self, new: NewListing) -> StoreResult<Listing> {
        let id = ListingId(self.next_listing_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let listing = Listing {
            id,
            dealer_id: new.dealer_id,
            make: new.make,
            model: new.model,
            year: new.year,
            price: new.price,
            mileage: new.mileage,
            location: new.location,
            transmission: new.transmission,
            fuel_type: new.fuel_type,
            description: new.description,
            images: new.images,
            status: ListingStatus::Available,
            view_count: 0,
            inquiry_count: 0,
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.listings.write().unwrap().insert(id, listing.clone());
        Ok(listing)
    }

    fn get_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        Ok(self.listings.read().unwrap().get(&id).cloned())
    }

    fn update_listing(&self, id: ListingId, update: ListingUpdate) -> StoreResult<Listing> {
        let mut listings = self.listings.write().unwrap();
        let listing = listings.get_mut(&id).ok_or(MarketError::NotFound)?;
        if let Some(price) = update.price {
            listing.price = price;
        }
        if let Some(mileage) = update.mileage {
            listing.mileage = mileage;
        }
        if let Some(location) = update.location {
            listing.location = location;
        }
        if let Some(description) = update.description {
            listing.description = description;
        }
        if let Some(images) = update.images {
            listing.images = images;
        }
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    fn set_status(&self, id: ListingId, status: ListingStatus) -> StoreResult<Listing> {
        let mut listings = self.listings.write().unwrap();
        let listing = listings.get_mut(&id).ok_or(MarketError::NotFound)?;
        listing.status = status;
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    fn delete_listing(&self, id: ListingId) -> StoreResult<()> {
        let mut listings = self.listings.write().unwrap();
        if listings.remove(&id).is_none() {
            return Err(MarketError::NotFound);
        }

        // Cascade engagement events and favorites
        self.events.write().unwrap().retain(|e| e.listing_id != id);
        self.favorites.write().unwrap().retain(|(_, lid)| *lid != id);

        Ok(())
    }

    fn listings_by_dealer(&self, dealer_id: AccountId) -> StoreResult<Vec<Listing>> {
        let mut listings: Vec<Listing> = self
            .listings
            .read()
            .unwrap()
            .values()
            .filter(|l| l.dealer_id == dealer_id)
            .cloned()
            .collect();
        listings.sort_by_key(|l| l.id.0);
        Ok(listings)
    }

    fn list_listings(&self) -> StoreResult<Vec<Listing>> {
        let mut listings: Vec<Listing> = self.listings.read().unwrap().values().cloned().collect();
        listings.sort_by_key(|l| l.id.0);
        Ok(listings)
    }

    fn record_event(
        &self,
        id: ListingId,
        kind: EngagementKind,
        token: &SessionToken,
    ) -> StoreResult<u64> {
        // Bump under the listings write lock so concurrent increments on the
        // same listing cannot lose updates
        let mut listings = self.listings.write().unwrap();
        let listing = listings.get_mut(&id).ok_or(MarketError::NotFound)?;
        let count = match kind {
            EngagementKind::View => {
                listing.view_count += 1;
                listing.view_count
            }
            EngagementKind::Inquiry => {
                listing.inquiry_count += 1;
                listing.inquiry_count
            }
        };

        self.events.write().unwrap().push(EngagementEvent {
            id: EventId(self.next_event_id.fetch_add(1, Ordering::SeqCst)),
            listing_id: id,
            kind,
            session_token: token.clone(),
            created_at: Utc::now(),
        });

        Ok(count)
    }

    fn list_events(&self) -> StoreResult<Vec<EngagementEvent>> {
        Ok(self.events.read().unwrap().clone())
    }

    fn toggle_favorite(
        &self,
        identity: &Identity,
        id: ListingId,
        action: FavoriteAction,
    ) -> StoreResult<bool> {
        let mut listings = self.listings.write().unwrap();
        let listing = listings.get_mut(&id).ok_or(MarketError::NotFound)?;

        let mut favorites = self.favorites.write().unwrap();
        let key = (identity.clone(), id);
        match action {
            FavoriteAction::Add => {
                // Set insertion makes the double-add race collapse to one entry
                if favorites.insert(key) {
                    listing.favorite_count += 1;
                }
                Ok(true)
            }
            FavoriteAction::Remove => {
                if favorites.remove(&key) {
                    listing.favorite_count = listing.favorite_count.saturating_sub(1);
                }
                Ok(false)
            }
        }
    }

    fn favorites_for(&self, identity: &Identity) -> StoreResult<Vec<ListingId>> {
        let mut ids: Vec<ListingId> = self
            .favorites
            .read()
            .unwrap()
            .iter()
            .filter(|(who, _)| who == identity)
            .map(|(_, lid)| *lid)
            .collect();
        ids.sort_by_key(|l| l.0);
        Ok(ids)
    }

    fn merge_favorites(&self, from: &Identity, into: &Identity) -> StoreResult<usize> {
        let mut listings = self.listings.write().unwrap();
        let mut favorites = self.favorites.write().unwrap();

        let moved: Vec<ListingId> = favorites
            .iter()
            .filter(|(who, _)| who == from)
            .map(|(_, lid)| *lid)
            .collect();

        let mut merged = 0;
        for lid in moved {
            favorites.remove(&(from.clone(), lid));
            // A stale reference never aborts the merge, it is just skipped
            let Some(listing) = listings.get_mut(&lid) else {
                continue;
            };
            if favorites.insert((into.clone(), lid)) {
                merged += 1;
            } else {
                // Already favorited by the account; the visitor entry is gone
                listing.favorite_count = listing.favorite_count.saturating_sub(1);
            }
        }

        Ok(merged)
    }
}

/// In-memory authenticated-session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create_session(&self, account_id: AccountId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            account_id,
            csrf_token: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().unwrap().get(id).cloned())
    }

    fn delete_session(&self, id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(id);
        Ok(())
    }
}

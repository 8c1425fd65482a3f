//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    Account, AccountId, AccountStore, CatalogStore, EngagementEvent, EngagementKind, EventId,
    FavoriteAction, Identity, Listing, ListingId, ListingStatus, ListingUpdate, NewAccount,
    NewListing, ProfileUpdate, Role, Session, SessionId, SessionStore, SessionToken, StoreResult,
};
use crate::error::MarketError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing AccountStore, CatalogStore, and SessionStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn internal(e: impl std::fmt::Display) -> MarketError {
    MarketError::Internal(e.to_string())
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// (kind, key) columns a favorite identity is stored under
fn identity_parts(identity: &Identity) -> (&'static str, String) {
    match identity {
        Identity::Visitor(token) => ("visitor", token.0.clone()),
        Identity::Account(id) => ("account", id.0.to_string()),
    }
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, MarketError> {
        let conn = Connection::open(path).map_err(internal)?;

        // Enable foreign keys so listing deletion cascades to events/favorites
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), MarketError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, MarketError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), MarketError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Dealer and admin accounts
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                verified INTEGER NOT NULL DEFAULT 0,
                company TEXT,
                phone TEXT,
                address TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Delegated-identity links (one per external email)
            CREATE TABLE IF NOT EXISTS delegated_identities (
                email TEXT PRIMARY KEY,
                account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE
            );

            -- Vehicle listings; counters are bumped in place
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                dealer_id INTEGER NOT NULL,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL,
                price INTEGER NOT NULL,
                mileage INTEGER NOT NULL,
                location TEXT NOT NULL,
                transmission TEXT NOT NULL,
                fuel_type TEXT NOT NULL,
                description TEXT NOT NULL,
                images TEXT NOT NULL,
                status TEXT NOT NULL,
                view_count INTEGER NOT NULL DEFAULT 0,
                inquiry_count INTEGER NOT NULL DEFAULT 0,
                favorite_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_listings_dealer ON listings(dealer_id);
            CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status);

            -- Append-only engagement events
            CREATE TABLE IF NOT EXISTS engagement_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id INTEGER NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                session_token TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_listing ON engagement_events(listing_id);

            -- Favorites, unique per (identity, listing)
            CREATE TABLE IF NOT EXISTS favorites (
                identity_kind TEXT NOT NULL,
                identity_key TEXT NOT NULL,
                listing_id INTEGER NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                UNIQUE(identity_kind, identity_key, listing_id)
            );

            -- Authenticated sessions
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                csrf_token TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(internal)?;

        Ok(())
    }

    fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
        let id: i64 = row.get(0)?;
        let role: String = row.get(4)?;
        let verified: i32 = row.get(5)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;
        Ok(Account {
            id: AccountId(id as u64),
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            role: Role::from_str(&role).unwrap_or(Role::Dealer),
            verified: verified != 0,
            company: row.get(6)?,
            phone: row.get(7)?,
            address: row.get(8)?,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }

    fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
        let id: i64 = row.get(0)?;
        let dealer_id: i64 = row.get(1)?;
        let images: String = row.get(11)?;
        let status: String = row.get(12)?;
        let view_count: i64 = row.get(13)?;
        let inquiry_count: i64 = row.get(14)?;
        let favorite_count: i64 = row.get(15)?;
        let created_at: String = row.get(16)?;
        let updated_at: String = row.get(17)?;
        Ok(Listing {
            id: ListingId(id as u64),
            dealer_id: AccountId(dealer_id as u64),
            make: row.get(2)?,
            model: row.get(3)?,
            year: row.get(4)?,
            price: row.get(5)?,
            mileage: row.get(6)?,
            location: row.get(7)?,
            transmission: row.get(8)?,
            fuel_type: row.get(9)?,
            description: row.get(10)?,
            images: serde_json::from_str(&images).unwrap_or_default(),
            status: ListingStatus::from_str(&status).unwrap_or(ListingStatus::Unavailable),
            view_count: view_count as u64,
            inquiry_count: inquiry_count as u64,
            favorite_count: favorite_count as u64,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, name, role, verified, company, phone, address, created_at, updated_at";

const LISTING_COLUMNS: &str = "id, dealer_id, make, model, year, price, mileage, location, \
     transmission, fuel_type, description, images, status, view_count, inquiry_count, \
     favorite_count, created_at, updated_at";

impl AccountStore for SqliteStore {
    fn create_account(&self, new: NewAccount) -> StoreResult<Account> {
        let normalized = new.email.to_lowercase();
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO accounts (email, password_hash, name, role, verified, company, phone, address, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                normalized,
                new.password_hash,
                new.name,
                new.role.as_str(),
                new.verified as i32,
                new.company,
                new.phone,
                new.address,
                now,
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return MarketError::Conflict;
                }
            }
            internal(e)
        })?;

        let id = AccountId(conn.last_insert_rowid() as u64);
        drop(conn);

        self.get_account(id)?.ok_or(MarketError::NotFound)
    }

    fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
            params![id.0 as i64],
            Self::account_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            params![normalized],
            Self::account_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> StoreResult<Account> {
        {
            let conn = self.conn.lock().unwrap();
            let rows_affected = conn
                .execute(
                    "UPDATE accounts SET
                        name = COALESCE(?1, name),
                        company = COALESCE(?2, company),
                        phone = COALESCE(?3, phone),
                        address = COALESCE(?4, address),
                        updated_at = ?5
                     WHERE id = ?6",
                    params![
                        update.name,
                        update.company,
                        update.phone,
                        update.address,
                        Utc::now().to_rfc3339(),
                        id.0 as i64,
                    ],
                )
                .map_err(internal)?;

            if rows_affected == 0 {
                return Err(MarketError::NotFound);
            }
        }

        self.get_account(id)?.ok_or(MarketError::NotFound)
    }

    fn set_verified(&self, id: AccountId, verified: bool) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn
            .execute(
                "UPDATE accounts SET verified = ?1, updated_at = ?2 WHERE id = ?3",
                params![verified as i32, Utc::now().to_rfc3339(), id.0 as i64],
            )
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(MarketError::NotFound);
        }

        Ok(())
    }

    fn link_delegated(&self, id: AccountId, email: &str) -> StoreResult<()> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO delegated_identities (email, account_id) VALUES (?1, ?2)",
            params![normalized, id.0 as i64],
        )
        .map_err(internal)?;

        Ok(())
    }

    fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // Delegated links and sessions cascade via foreign keys
        let rows_affected = conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id.0 as i64])
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(MarketError::NotFound);
        }

        Ok(())
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"
            ))
            .map_err(internal)?;

        let accounts = stmt
            .query_map([], Self::account_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(accounts)
    }
}

impl CatalogStore for SqliteStore {
    fn create_listing(&self, new: NewListing) -> StoreResult<Listing> {
        let images = serde_json::to_string(&new.images).map_err(internal)?;
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO listings (dealer_id, make, model, year, price, mileage, location,
                transmission, fuel_type, description, images, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                new.dealer_id.0 as i64,
                new.make,
                new.model,
                new.year,
                new.price,
                new.mileage,
                new.location,
                new.transmission,
                new.fuel_type,
                new.description,
                images,
                ListingStatus::Available.as_str(),
                now,
            ],
        )
        .map_err(internal)?;

        let id = ListingId(conn.last_insert_rowid() as u64);
        drop(conn);

        self.get_listing(id)?.ok_or(MarketError::NotFound)
    }

    fn get_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
            params![id.0 as i64],
            Self::listing_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn update_listing(&self, id: ListingId, update: ListingUpdate) -> StoreResult<Listing> {
        let images = match &update.images {
            Some(images) => Some(serde_json::to_string(images).map_err(internal)?),
            None => None,
        };

        {
            let conn = self.conn.lock().unwrap();
            let rows_affected = conn
                .execute(
                    "UPDATE listings SET
                        price = COALESCE(?1, price),
                        mileage = COALESCE(?2, mileage),
                        location = COALESCE(?3, location),
                        description = COALESCE(?4, description),
                        images = COALESCE(?5, images),
                        updated_at = ?6
                     WHERE id = ?7",
                    params![
                        update.price,
                        update.mileage,
                        update.location,
                        update.description,
                        images,
                        Utc::now().to_rfc3339(),
                        id.0 as i64,
                    ],
                )
                .map_err(internal)?;

            if rows_affected == 0 {
                return Err(MarketError::NotFound);
            }
        }

        self.get_listing(id)?.ok_or(MarketError::NotFound)
    }

    fn set_status(&self, id: ListingId, status: ListingStatus) -> StoreResult<Listing> {
        {
            let conn = self.conn.lock().unwrap();
            let rows_affected = conn
                .execute(
                    "UPDATE listings SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.as_str(), Utc::now().to_rfc3339(), id.0 as i64],
                )
                .map_err(internal)?;

            if rows_affected == 0 {
                return Err(MarketError::NotFound);
            }
        }

        self.get_listing(id)?.ok_or(MarketError::NotFound)
    }

    fn delete_listing(&self, id: ListingId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // Events and favorites cascade via foreign keys
        let rows_affected = conn
            .execute("DELETE FROM listings WHERE id = ?1", params![id.0 as i64])
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(MarketError::NotFound);
        }

        Ok(())
    }

    fn listings_by_dealer(&self, dealer_id: AccountId) -> StoreResult<Vec<Listing>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings WHERE dealer_id = ?1 ORDER BY id"
            ))
            .map_err(internal)?;

        let listings = stmt
            .query_map(params![dealer_id.0 as i64], Self::listing_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(listings)
    }

    fn list_listings(&self) -> StoreResult<Vec<Listing>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {LISTING_COLUMNS} FROM listings ORDER BY id"
            ))
            .map_err(internal)?;

        let listings = stmt
            .query_map([], Self::listing_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(listings)
    }

    fn record_event(
        &self,
        id: ListingId,
        kind: EngagementKind,
        token: &SessionToken,
    ) -> StoreResult<u64> {
        let counter = match kind {
            EngagementKind::View => "view_count",
            EngagementKind::Inquiry => "inquiry_count",
        };

        let mut conn = self.conn.lock().unwrap();

        // Counter bump and event row commit together or not at all
        let tx = conn.transaction().map_err(internal)?;

        // Native atomic increment, never read-modify-write in application code
        let rows_affected = tx
            .execute(
                &format!("UPDATE listings SET {counter} = {counter} + 1 WHERE id = ?1"),
                params![id.0 as i64],
            )
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(MarketError::NotFound);
        }

        tx.execute(
            "INSERT INTO engagement_events (listing_id, kind, session_token, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.0 as i64,
                kind.as_str(),
                token.0,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        let count = tx
            .query_row(
                &format!("SELECT {counter} FROM listings WHERE id = ?1"),
                params![id.0 as i64],
                |row| row.get::<_, i64>(0),
            )
            .map_err(internal)?;

        tx.commit().map_err(internal)?;
        Ok(count as u64)
    }

    fn list_events(&self) -> StoreResult<Vec<EngagementEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, listing_id, kind, session_token, created_at
                 FROM engagement_events ORDER BY id",
            )
            .map_err(internal)?;

        let events = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let listing_id: i64 = row.get(1)?;
                let kind: String = row.get(2)?;
                let session_token: String = row.get(3)?;
                let created_at: String = row.get(4)?;
                Ok(EngagementEvent {
                    id: EventId(id as u64),
                    listing_id: ListingId(listing_id as u64),
                    kind: EngagementKind::from_str(&kind).unwrap_or(EngagementKind::View),
                    session_token: SessionToken(session_token),
                    created_at: parse_ts(&created_at),
                })
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(events)
    }

    fn toggle_favorite(
        &self,
        identity: &Identity,
        id: ListingId,
        action: FavoriteAction,
    ) -> StoreResult<bool> {
        let (kind, key) = identity_parts(identity);
        let conn = self.conn.lock().unwrap();

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM listings WHERE id = ?1)",
                params![id.0 as i64],
                |row| row.get(0),
            )
            .map_err(internal)?;
        if !exists {
            return Err(MarketError::NotFound);
        }

        match action {
            FavoriteAction::Add => {
                // The UNIQUE index collapses concurrent double-adds
                let inserted = conn
                    .execute(
                        "INSERT OR IGNORE INTO favorites (identity_kind, identity_key, listing_id, created_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![kind, key, id.0 as i64, Utc::now().to_rfc3339()],
                    )
                    .map_err(internal)?;
                if inserted > 0 {
                    conn.execute(
                        "UPDATE listings SET favorite_count = favorite_count + 1 WHERE id = ?1",
                        params![id.0 as i64],
                    )
                    .map_err(internal)?;
                }
                Ok(true)
            }
            FavoriteAction::Remove => {
                let removed = conn
                    .execute(
                        "DELETE FROM favorites WHERE identity_kind = ?1 AND identity_key = ?2 AND listing_id = ?3",
                        params![kind, key, id.0 as i64],
                    )
                    .map_err(internal)?;
                if removed > 0 {
                    conn.execute(
                        "UPDATE listings SET favorite_count = MAX(favorite_count - 1, 0) WHERE id = ?1",
                        params![id.0 as i64],
                    )
                    .map_err(internal)?;
                }
                Ok(false)
            }
        }
    }

    fn favorites_for(&self, identity: &Identity) -> StoreResult<Vec<ListingId>> {
        let (kind, key) = identity_parts(identity);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT listing_id FROM favorites
                 WHERE identity_kind = ?1 AND identity_key = ?2 ORDER BY listing_id",
            )
            .map_err(internal)?;

        let ids = stmt
            .query_map(params![kind, key], |row| {
                row.get::<_, i64>(0).map(|id| ListingId(id as u64))
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(ids)
    }

    fn merge_favorites(&self, from: &Identity, into: &Identity) -> StoreResult<usize> {
        let visitor_ids = self.favorites_for(from)?;
        let (from_kind, from_key) = identity_parts(from);
        let (into_kind, into_key) = identity_parts(into);

        let conn = self.conn.lock().unwrap();
        let mut merged = 0;

        for lid in visitor_ids {
            conn.execute(
                "DELETE FROM favorites WHERE identity_kind = ?1 AND identity_key = ?2 AND listing_id = ?3",
                params![from_kind, from_key, lid.0 as i64],
            )
            .map_err(internal)?;

            // Stale listing references are skipped, never fatal
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM listings WHERE id = ?1)",
                    params![lid.0 as i64],
                    |row| row.get(0),
                )
                .map_err(internal)?;
            if !exists {
                continue;
            }

            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO favorites (identity_kind, identity_key, listing_id, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![into_kind, into_key, lid.0 as i64, Utc::now().to_rfc3339()],
                )
                .map_err(internal)?;
            if inserted > 0 {
                merged += 1;
            } else {
                // Account already had it; the visitor entry just vanished
                conn.execute(
                    "UPDATE listings SET favorite_count = MAX(favorite_count - 1, 0) WHERE id = ?1",
                    params![lid.0 as i64],
                )
                .map_err(internal)?;
            }
        }

        Ok(merged)
    }
}

impl SessionStore for SqliteStore {
    fn create_session(&self, account_id: AccountId) -> StoreResult<Session> {
        let conn = self.conn.lock().unwrap();
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            account_id,
            csrf_token: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, account_id, csrf_token, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.0,
                session.account_id.0 as i64,
                session.csrf_token,
                session.created_at.to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        Ok(session)
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, account_id, csrf_token, created_at FROM sessions WHERE id = ?1",
            params![id.0],
            |row| {
                let id: String = row.get(0)?;
                let account_id: i64 = row.get(1)?;
                let csrf_token: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok(Session {
                    id: SessionId(id),
                    account_id: AccountId(account_id as u64),
                    csrf_token,
                    created_at: parse_ts(&created_at),
                })
            },
        )
        .optional()
        .map_err(internal)
    }

    fn delete_session(&self, id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.0])
            .map_err(internal)?;
        Ok(())
    }
}

// Trait forwarding for Arc<SqliteStore>, so one store backs all three roles
impl AccountStore for std::sync::Arc<SqliteStore> {
    fn create_account(&self, new: NewAccount) -> StoreResult<Account> {
        (**self).create_account(new)
    }

    fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        (**self).get_account(id)
    }

    fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        (**self).get_account_by_email(email)
    }

    fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> StoreResult<Account> {
        (**self).update_profile(id, update)
    }

    fn set_verified(&self, id: AccountId, verified: bool) -> StoreResult<()> {
        (**self).set_verified(id, verified)
    }

    fn link_delegated(&self, id: AccountId, email: &str) -> StoreResult<()> {
        (**self).link_delegated(id, email)
    }

    fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        (**self).delete_account(id)
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        (**self).list_accounts()
    }
}

impl CatalogStore for std::sync::Arc<SqliteStore> {
    fn create_listing(&self, new: NewListing) -> StoreResult<Listing> {
        (**self).create_listing(new)
    }

    fn get_listing(&self, id: ListingId) -> StoreResult<Option<Listing>> {
        (**self).get_listing(id)
    }

    fn update_listing(&self, id: ListingId, update: ListingUpdate) -> StoreResult<Listing> {
        (**self).update_listing(id, update)
    }

    fn set_status(&self, id: ListingId, status: ListingStatus) -> StoreResult<Listing> {
        (**self).set_status(id, status)
    }

    fn delete_listing(&self, id: ListingId) -> StoreResult<()> {
        (**self).delete_listing(id)
    }

    fn listings_by_dealer(&self, dealer_id: AccountId) -> StoreResult<Vec<Listing>> {
        (**self).listings_by_dealer(dealer_id)
    }

    fn list_listings(&self) -> StoreResult<Vec<Listing>> {
        (**self).list_listings()
    }

    fn record_event(
        &self,
        id: ListingId,
        kind: EngagementKind,
        token: &SessionToken,
    ) -> StoreResult<u64> {
        (**self).record_event(id, kind, token)
    }

    fn list_events(&self) -> StoreResult<Vec<EngagementEvent>> {
        (**self).list_events()
    }

    fn toggle_favorite(
        &self,
        identity: &Identity,
        id: ListingId,
        action: FavoriteAction,
    ) -> StoreResult<bool> {
        (**self).toggle_favorite(identity, id, action)
    }

    fn favorites_for(&self, identity: &Identity) -> StoreResult<Vec<ListingId>> {
        (**self).favorites_for(identity)
    }

    fn merge_favorites(&self, from: &Identity, into: &Identity) -> StoreResult<usize> {
        (**self).merge_favorites(from, into)
    }
}

impl SessionStore for std::sync::Arc<SqliteStore> {
    fn create_session(&self, account_id: AccountId) -> StoreResult<Session> {
        (**self).create_session(account_id)
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<Session>> {
        (**self).get_session(id)
    }

    fn delete_session(&self, id: &SessionId) -> StoreResult<()> {
        (**self).delete_session(id)
    }
}

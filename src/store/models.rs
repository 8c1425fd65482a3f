//! Domain models for marketplace storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

/// Unique listing identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub u64);

/// Unique engagement event identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

/// Server-side identifier of an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Opaque token identifying an anonymous visitor
///
/// Minted server-side but held entirely client-side; it only exists as the
/// attribution key on engagement events and visitor favorites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Publishes and manages vehicle listings
    Dealer,
    /// Moderates all dealers' data
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Dealer => "dealer",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dealer" => Some(Role::Dealer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Lifecycle status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
    Unavailable,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "AVAILABLE",
            ListingStatus::Pending => "PENDING",
            ListingStatus::Sold => "SOLD",
            ListingStatus::Unavailable => "UNAVAILABLE",
        }
    }

    /// Parse against the allow-list of known statuses
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(ListingStatus::Available),
            "PENDING" => Some(ListingStatus::Pending),
            "SOLD" => Some(ListingStatus::Sold),
            "UNAVAILABLE" => Some(ListingStatus::Unavailable),
            _ => None,
        }
    }

    /// Whether the state machine permits moving from `self` to `next`
    ///
    /// SOLD and UNAVAILABLE are not terminal, but re-entry goes through
    /// AVAILABLE or PENDING explicitly.
    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        match self {
            ListingStatus::Available => matches!(
                next,
                ListingStatus::Pending | ListingStatus::Sold | ListingStatus::Unavailable
            ),
            ListingStatus::Pending => {
                matches!(next, ListingStatus::Available | ListingStatus::Sold)
            }
            ListingStatus::Sold | ListingStatus::Unavailable => {
                matches!(next, ListingStatus::Available | ListingStatus::Pending)
            }
        }
    }
}

/// Kind of engagement event recorded against a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementKind {
    View,
    Inquiry,
}

impl EngagementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementKind::View => "view",
            EngagementKind::Inquiry => "inquiry",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view" => Some(EngagementKind::View),
            "inquiry" => Some(EngagementKind::Inquiry),
            _ => None,
        }
    }
}

/// Identity a favorite is attributed to: an anonymous visitor or an account
///
/// Both variants are equally valid keys; reconciliation at sign-in moves
/// favorites from the `Visitor` variant to the `Account` variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Visitor(SessionToken),
    Account(AccountId),
}

/// Requested direction of a favorite toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    Add,
    Remove,
}

/// A dealer or administrator account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    /// Stored lowercased; lookups are case-insensitive
    pub email: String,
    /// None for delegated-identity-only accounts
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an account; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Self-service profile fields an account may update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// One vehicle offered by a dealer
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: ListingId,
    pub dealer_id: AccountId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub mileage: i64,
    pub location: String,
    pub transmission: String,
    pub fuel_type: String,
    pub description: String,
    /// External image references, consumed verbatim; at least one at creation
    pub images: Vec<String>,
    pub status: ListingStatus,
    pub view_count: u64,
    pub inquiry_count: u64,
    /// Size of the live favorite set: unlike the view and inquiry counters,
    /// this decrements when a favorite is removed or deduplicated at merge
    pub favorite_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a listing; status starts AVAILABLE, counters at zero
#[derive(Debug, Clone)]
pub struct NewListing {
    pub dealer_id: AccountId,
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
}

/// Editable listing fields; None leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ListingUpdate {
    pub price: Option<i64>,
    pub mileage: Option<i64>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Append-only record of a single view or inquiry
#[derive(Debug, Clone)]
pub struct EngagementEvent {
    pub id: EventId,
    pub listing_id: ListingId,
    pub kind: EngagementKind,
    pub session_token: SessionToken,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub account_id: AccountId,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
}

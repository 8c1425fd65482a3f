//! Authorization guard
//!
//! Every mutating or privileged endpoint funnels through [`authorize`], so
//! "who can do what" is decided in exactly one place.

use crate::error::MarketError;
use crate::store::{Account, AccountId, Role};

/// Privileged action a caller is attempting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Any admin-prefixed endpoint
    Admin,
    /// Publish a new listing (verification not required; unverified dealers
    /// are simply excluded from public search)
    CreateListing,
    /// Edit, delete, or change the status of a listing owned by `owner`
    MutateListing { owner: AccountId },
    /// Delete the account `target` via the admin surface
    DeleteAccount { target: AccountId },
    /// Read the caller's own dealer feed (all statuses)
    ViewOwnListings,
}

/// Admit or reject an action for the (possibly absent) authenticated account
pub fn authorize(account: Option<&Account>, action: Action) -> Result<(), MarketError> {
    let account = account.ok_or(MarketError::Unauthorized)?;

    match action {
        Action::Admin => match account.role {
            Role::Admin => Ok(()),
            Role::Dealer => Err(MarketError::Forbidden),
        },
        Action::CreateListing | Action::ViewOwnListings => match account.role {
            Role::Dealer => Ok(()),
            Role::Admin => Err(MarketError::Forbidden),
        },
        Action::MutateListing { owner } => match account.role {
            Role::Admin => Ok(()),
            Role::Dealer if owner == account.id => Ok(()),
            Role::Dealer => Err(MarketError::Forbidden),
        },
        Action::DeleteAccount { target } => {
            if account.role != Role::Admin {
                return Err(MarketError::Forbidden);
            }
            // Self-protection: an admin may not delete itself
            if target == account.id {
                return Err(MarketError::InvalidOperation);
            }
            Ok(())
        }
    }
}

//! Search/filter composition over the listing catalog
//!
//! Each present query parameter contributes one predicate over a
//! `(listing, dealer)` pair; matching is the fold of all of them. Absent
//! filters contribute nothing, so any subset composes without special cases.

use serde::Deserialize;

use crate::error::MarketError;
use crate::store::{Account, Listing};

/// Sort order for listing feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Descending view count; raw view frequency is the "trending" signal
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    YearNew,
    MileageLow,
}

impl SortKey {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "featured" => Some(SortKey::Featured),
            "price-low" => Some(SortKey::PriceLow),
            "price-high" => Some(SortKey::PriceHigh),
            "year-new" => Some(SortKey::YearNew),
            "mileage-low" => Some(SortKey::MileageLow),
            _ => None,
        }
    }
}

/// Optional filter set deserialized from listing-feed query parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingQuery {
    /// Case-insensitive substring over make, model, and dealer name
    pub q: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub location: Option<String>,
    pub dealer_id: Option<u64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_mileage: Option<i64>,
    pub max_mileage: Option<i64>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// A single filter predicate over a listing and its dealer
pub type Predicate<'a> = Box<dyn Fn(&Listing, &Account) -> bool + Send + Sync + 'a>;

impl ListingQuery {
    /// Resolve the requested sort, defaulting to featured
    pub fn sort_key(&self) -> Result<SortKey, MarketError> {
        match &self.sort {
            None => Ok(SortKey::default()),
            Some(s) => SortKey::from_str(s)
                .ok_or_else(|| MarketError::Validation(format!("unknown sort '{s}'"))),
        }
    }

    /// Collect one predicate per present filter
    pub fn predicates(&self) -> Vec<Predicate<'_>> {
        let mut preds: Vec<Predicate<'_>> = Vec::new();

        if let Some(q) = &self.q {
            let needle = q.to_lowercase();
            preds.push(Box::new(move |l, d| {
                l.make.to_lowercase().contains(&needle)
                    || l.model.to_lowercase().contains(&needle)
                    || d.name.to_lowercase().contains(&needle)
            }));
        }
        if let Some(make) = &self.make {
            preds.push(Box::new(move |l, _| l.make.eq_ignore_ascii_case(make)));
        }
        if let Some(model) = &self.model {
            preds.push(Box::new(move |l, _| l.model.eq_ignore_ascii_case(model)));
        }
        if let Some(transmission) = &self.transmission {
            preds.push(Box::new(move |l, _| {
                l.transmission.eq_ignore_ascii_case(transmission)
            }));
        }
        if let Some(fuel_type) = &self.fuel_type {
            preds.push(Box::new(move |l, _| {
                l.fuel_type.eq_ignore_ascii_case(fuel_type)
            }));
        }
        if let Some(location) = &self.location {
            preds.push(Box::new(move |l, _| {
                l.location.eq_ignore_ascii_case(location)
            }));
        }
        if let Some(dealer_id) = self.dealer_id {
            preds.push(Box::new(move |l, _| l.dealer_id.0 == dealer_id));
        }
        if let Some(min) = self.min_year {
            preds.push(Box::new(move |l, _| l.year >= min));
        }
        if let Some(max) = self.max_year {
            preds.push(Box::new(move |l, _| l.year <= max));
        }
        if let Some(min) = self.min_price {
            preds.push(Box::new(move |l, _| l.price >= min));
        }
        if let Some(max) = self.max_price {
            preds.push(Box::new(move |l, _| l.price <= max));
        }
        if let Some(min) = self.min_mileage {
            preds.push(Box::new(move |l, _| l.mileage >= min));
        }
        if let Some(max) = self.max_mileage {
            preds.push(Box::new(move |l, _| l.mileage <= max));
        }

        preds
    }
}

/// Order listings in place by the given sort key
pub fn sort_listings(listings: &mut [Listing], key: SortKey) {
    match key {
        SortKey::Featured => listings.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        SortKey::PriceLow => listings.sort_by_key(|l| l.price),
        SortKey::PriceHigh => listings.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::YearNew => listings.sort_by(|a, b| b.year.cmp(&a.year)),
        SortKey::MileageLow => listings.sort_by_key(|l| l.mileage),
    }
}

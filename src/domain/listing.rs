use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::IdentityKey;

/// Placeholder printed for fields that could not be extracted.
pub const UNAVAILABLE: &str = "N/A";

/// One reference to an entry in the results feed.
///
/// Candidates are identified by their place URL rather than a live element
/// handle, so navigating away and back never invalidates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub locator: String,
    pub discovery_order: usize,
}

impl CandidateEntry {
    pub fn new(locator: impl Into<String>, discovery_order: usize) -> Self {
        Self {
            locator: locator.into(),
            discovery_order,
        }
    }
}

/// Boolean service attributes advertised by a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFlags {
    pub store_shopping: bool,
    pub in_store_pickup: bool,
    pub delivery: bool,
}

/// Canonical, deduplicated output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
    pub introduction: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: Option<u32>,
    pub store_shopping: bool,
    pub in_store_pickup: bool,
    pub delivery: bool,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

impl ListingRecord {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        let name = name.into();
        let mut record = Self {
            id: String::new(),
            name,
            category: None,
            address: None,
            phone: None,
            website: None,
            opening_hours: None,
            introduction: None,
            average_rating: None,
            review_count: None,
            store_shopping: false,
            in_store_pickup: false,
            delivery: false,
            source_url: source_url.into(),
            scraped_at: Utc::now(),
        };
        record.id = record.identity_key().fingerprint();
        record
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(
            Some(&self.name),
            self.address.as_deref(),
            self.phone.as_deref(),
        )
    }

    /// Recompute the id after the identity fields were filled in.
    pub fn with_identity(mut self) -> Self {
        self.id = self.identity_key().fingerprint();
        self
    }

    pub fn set_services(&mut self, flags: ServiceFlags) {
        self.store_shopping = flags.store_shopping;
        self.in_store_pickup = flags.in_store_pickup;
        self.delivery = flags.delivery;
    }

    pub fn services(&self) -> ServiceFlags {
        ServiceFlags {
            store_shopping: self.store_shopping,
            in_store_pickup: self.in_store_pickup,
            delivery: self.delivery,
        }
    }

    pub fn display_rating(&self) -> String {
        self.average_rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }

    pub fn display_review_count(&self) -> String {
        self.review_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }
}

/// Render an optional field for text and CSV output.
pub fn or_unavailable(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNAVAILABLE)
}

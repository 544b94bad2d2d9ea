pub mod identity;
pub mod listing;
pub mod search;

pub use identity::IdentityKey;
pub use listing::{CandidateEntry, ListingRecord, ServiceFlags, UNAVAILABLE};
pub use search::{JobStatus, SearchParams, DEFAULT_MAX_RESULTS};

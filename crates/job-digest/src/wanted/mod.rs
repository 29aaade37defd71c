//! Wanted listings API.
//!
//! Provides the listing types and a single-request fetcher.

mod fetcher;
mod types;

pub use fetcher::JobFetcher;
pub use types::{Company, Listing, ListingId, PLACEHOLDER};

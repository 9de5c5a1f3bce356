//! Place lookup abstraction
//!
//! The venue core only needs two things from a place directory: find the best
//! match for a free-text query, and fetch the volatile details (opening hours,
//! website, phone) for a known place id. Each backend implements both.

use crate::{
    error::AppResult,
    models::{PlaceCandidate, PlaceDetails},
};

pub mod google_places;

pub use google_places::{GooglePlacesProvider, RetryPolicy};

/// Trait for place lookup backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Best match for a free-text query.
    ///
    /// `Ok(None)` means the service found nothing, which is not an error.
    async fn search_by_text(&self, query: &str) -> AppResult<Option<PlaceCandidate>>;

    /// Current details for a place id obtained from a previous search
    async fn fetch_details(&self, place_id: &str) -> AppResult<PlaceDetails>;
}

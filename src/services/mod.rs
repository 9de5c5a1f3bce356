pub mod acquire;
pub mod enrichment;
pub mod providers;
pub mod recommendations;
pub mod venues;

pub use acquire::acquire_venue_from_search;
pub use enrichment::{EnrichmentSync, SyncEntry, SyncOutcome, SyncPolicy, SyncReport};
pub use recommendations::{RecommendationSelector, Selection, Weights};

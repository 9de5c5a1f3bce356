use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::AppResult, services::providers::PlaceLookup, store::VenueStore,
};

/// What to do when refreshing one venue fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Stop at the first failure and return it
    FailFast,
    /// Attempt every venue and record each outcome
    #[default]
    ContinueOnError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Refreshed,
    /// Manually entered venue, nothing to refresh from
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncEntry {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Per-venue result of one enrichment run, in store listing order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }

    pub fn refreshed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Refreshed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed { .. }))
    }
}

/// Refreshes opening hours, website and phone number of every venue that
/// came from the place lookup service
#[derive(Clone)]
pub struct EnrichmentSync {
    store: VenueStore,
    lookup: Arc<dyn PlaceLookup>,
}

impl EnrichmentSync {
    pub fn new(store: VenueStore, lookup: Arc<dyn PlaceLookup>) -> Self {
        Self { store, lookup }
    }

    /// Runs one pass over the store.
    ///
    /// A failing listing always aborts. Per-venue failures abort under
    /// [`SyncPolicy::FailFast`] and are recorded otherwise.
    pub async fn run(&self, policy: SyncPolicy) -> AppResult<SyncReport> {
        let venues = self.store.list_all().await?;
        let mut report = SyncReport::default();

        tracing::info!(venues = venues.len(), ?policy, "Enrichment sync started");

        for venue in venues {
            let outcome = if venue.place_id.is_empty() {
                SyncOutcome::Skipped
            } else {
                match self.refresh(&venue.id, &venue.place_id).await {
                    Ok(()) => SyncOutcome::Refreshed,
                    Err(e) if policy == SyncPolicy::FailFast => {
                        tracing::error!(venue_id = %venue.id, error = %e, "Enrichment sync aborted");
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!(venue_id = %venue.id, error = %e, "Venue refresh failed");
                        SyncOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };

            report.entries.push(SyncEntry {
                id: venue.id,
                name: venue.name,
                outcome,
            });
        }

        tracing::info!(
            refreshed = report.refreshed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Enrichment sync finished"
        );

        Ok(report)
    }

    /// Fetches first, then merges into a freshly loaded copy under the venue
    /// lock so concurrent visit appends are not lost
    async fn refresh(&self, id: &str, place_id: &str) -> AppResult<()> {
        let details = self.lookup.fetch_details(place_id).await?;

        let _guard = self.store.lock(id).await;
        let mut venue = self.store.load(id).await?;
        venue.apply_details(details);
        self.store.save(&venue).await?;

        tracing::debug!(venue_id = %id, place_id = %place_id, "Venue refreshed");

        Ok(())
    }
}

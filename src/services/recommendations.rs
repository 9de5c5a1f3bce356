use chrono::{DateTime, Utc};
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::Venue,
    store::VenueStore,
};

/// Days assumed since the last visit for a venue never visited
pub const DEFAULT_DAYS_SINCE_VISIT: i64 = 356;

/// Multipliers of the weighted pick
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Weights {
    pub rating: f64,
    pub last_visit: f64,
    pub day_count: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            rating: 1.0,
            last_visit: 1.0,
            day_count: 1.0,
        }
    }
}

impl Weights {
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("rating", self.rating),
            ("last_visit", self.last_visit),
            ("day_count", self.day_count),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Configuration(format!(
                    "Weight {} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.day_count == 0.0 {
            return Err(AppError::Configuration(
                "Weight day_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which venues a pick may return and whether it is weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Admit venues without visits
    pub include_new: bool,
    /// Admit venues with at least one visit
    pub include_old: bool,
    pub weighted: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            include_new: true,
            include_old: true,
            weighted: false,
        }
    }
}

impl Selection {
    /// Uniform pick among venues never visited
    pub fn unvisited() -> Self {
        Self {
            include_new: true,
            include_old: false,
            weighted: false,
        }
    }

    pub fn admits(&self, venue: &Venue) -> bool {
        if venue.is_visited() {
            self.include_old
        } else {
            self.include_new
        }
    }
}

/// Picks the next venue to eat at.
///
/// Weighted picks favour well rated venues that have not been visited for a
/// long time and have been visited rarely. A venue's chance is proportional to
/// its [`score`](RecommendationSelector::score).
#[derive(Debug, Clone)]
pub struct RecommendationSelector {
    weights: Weights,
}

impl RecommendationSelector {
    pub fn new(weights: Weights) -> AppResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Number of tickets the venue gets in a weighted pick
    pub fn score(&self, venue: &Venue, now: DateTime<Utc>) -> u64 {
        let days = match venue.last_visit() {
            Some(last) => {
                let days = (now - *last).num_days();
                // clock skew
                if days < 0 {
                    1
                } else {
                    days
                }
            }
            None => DEFAULT_DAYS_SINCE_VISIT,
        };
        let count = venue.visits.len().max(1);

        let recency = days as f64 * self.weights.last_visit
            / (count as f64 * self.weights.day_count);
        let score = (recency * (f64::from(venue.rating) * self.weights.rating)).ceil();

        if score.is_nan() || score <= 0.0 {
            0
        } else {
            score.min(f64::from(u32::MAX)) as u64
        }
    }

    /// Filters `venues` by `selection` and picks one of the rest.
    ///
    /// Falls back to a uniform pick when every candidate scores zero.
    pub fn choose<R: Rng>(
        &self,
        venues: Vec<Venue>,
        selection: Selection,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<Venue> {
        let mut candidates: Vec<Venue> = venues
            .into_iter()
            .filter(|v| selection.admits(v))
            .collect();

        if candidates.is_empty() {
            return Err(AppError::EmptyCandidates);
        }

        let index = if selection.weighted {
            let scores: Vec<u64> = candidates.iter().map(|v| self.score(v, now)).collect();
            match WeightedIndex::new(&scores) {
                Ok(dist) => dist.sample(rng),
                Err(_) => {
                    tracing::debug!(
                        candidates = candidates.len(),
                        "All candidates scored zero, picking uniformly"
                    );
                    rng.gen_range(0..candidates.len())
                }
            }
        } else {
            rng.gen_range(0..candidates.len())
        };

        Ok(candidates.swap_remove(index))
    }
}

/// Lists the store and picks one venue with the shared generator
pub async fn next_venue<R: Rng + Send>(
    store: &VenueStore,
    selector: &RecommendationSelector,
    rng: &Mutex<R>,
    selection: Selection,
) -> AppResult<Venue> {
    let venues = store.list_all().await?;
    let total = venues.len();

    let venue = {
        let mut rng = rng.lock().await;
        selector.choose(venues, selection, Utc::now(), &mut *rng)?
    };

    tracing::info!(
        venue_id = %venue.id,
        total,
        weighted = selection.weighted,
        "Venue selected"
    );

    Ok(venue)
}

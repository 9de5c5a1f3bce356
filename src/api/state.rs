use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::Mutex;

use crate::{
    config::Config,
    services::{
        providers::{GooglePlacesProvider, PlaceLookup},
        EnrichmentSync, RecommendationSelector,
    },
    store::VenueStore,
};

/// Shared application state
///
/// Everything here is built once at startup; handlers only clone handles.
#[derive(Clone)]
pub struct AppState {
    pub store: VenueStore,
    pub lookup: Arc<dyn PlaceLookup>,
    pub selector: Arc<RecommendationSelector>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new(
        store: VenueStore,
        lookup: Arc<dyn PlaceLookup>,
        selector: RecommendationSelector,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            lookup,
            selector: Arc::new(selector),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Opens the store and wires the Google Places client from configuration
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = VenueStore::open(&config.data_dir).await?;

        if config.google_api_key.is_empty() {
            tracing::warn!("GOOGLE_API_KEY is not set, place lookups will fail");
        }
        let lookup = GooglePlacesProvider::new(
            config.google_api_key.clone(),
            config.places_api_url.clone(),
            config.lookup_timeout(),
            config.retry_policy(),
        )?;

        let selector = RecommendationSelector::new(config.weights()?)?;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self::new(store, Arc::new(lookup), selector, rng))
    }

    pub fn enrichment(&self) -> EnrichmentSync {
        EnrichmentSync::new(self.store.clone(), self.lookup.clone())
    }
}

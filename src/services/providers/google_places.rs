//! Google Places web service provider
//!
//! API Flow:
//! 1. Search: /maps/api/place/findplacefromtext/json → place id, name, address, rating
//! 2. Details: /maps/api/place/details/json → opening hours, website, phone
//!
//! Every request carries a timeout. Transport failures, 5xx/429 answers and
//! the `OVER_QUERY_LIMIT` / `UNKNOWN_ERROR` body statuses are retried with
//! exponential backoff; everything else fails on the first attempt.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    models::{
        FindPlaceResponse, PlaceCandidate, PlaceDetails, PlaceDetailsResponse, PlacesStatus,
    },
    services::providers::PlaceLookup,
};

const FIND_PLACE_ENDPOINT: &str = "/maps/api/place/findplacefromtext/json";
const DETAILS_ENDPOINT: &str = "/maps/api/place/details/json";
const SEARCH_FIELDS: &str = "formatted_address,name,place_id,rating";
const DETAIL_FIELDS: &str = "opening_hours,website,international_phone_number";

/// How often and how patiently transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Status and message shared by all Places response bodies
trait PlacesEnvelope {
    fn status(&self) -> &PlacesStatus;
    fn error_message(&self) -> Option<&str>;

    fn describe(&self) -> String {
        format!(
            "Places API status {:?}: {}",
            self.status(),
            self.error_message().unwrap_or("no message")
        )
    }
}

impl PlacesEnvelope for FindPlaceResponse {
    fn status(&self) -> &PlacesStatus {
        &self.status
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl PlacesEnvelope for PlaceDetailsResponse {
    fn status(&self) -> &PlacesStatus {
        &self.status
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// A failed attempt and whether repeating it could help
struct AttemptFailure {
    error: AppError,
    transient: bool,
}

#[derive(Clone)]
pub struct GooglePlacesProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    retry: RetryPolicy,
}

impl GooglePlacesProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy {
                max_attempts: retry.max_attempts.max(1),
                ..retry
            },
        })
    }

    fn ensure_api_key(&self) -> AppResult<()> {
        if self.api_key.is_empty() {
            return Err(AppError::ExternalLookup(
                "No Places API key configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Sends one GET request and decodes the body
    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AttemptFailure> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AttemptFailure {
                transient: e.is_timeout() || e.is_connect(),
                // the url carries the API key
                error: e.without_url().into(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptFailure {
                transient: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
                error: AppError::ExternalLookup(format!(
                    "Places API returned status {}: {}",
                    status, body
                )),
            });
        }

        response.json::<T>().await.map_err(|e| AttemptFailure {
            transient: e.is_timeout(),
            error: AppError::ExternalLookup(format!(
                "Failed to parse Places response: {}",
                e.without_url()
            )),
        })
    }

    /// GETs an endpoint, retrying transient failures with exponential backoff.
    ///
    /// Returns the body for any non-transient status; callers interpret it.
    async fn get<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> AppResult<T>
    where
        T: DeserializeOwned + PlacesEnvelope,
    {
        let url = format!("{}{}", self.api_url, endpoint);
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;

        loop {
            let failure = match self.attempt::<T>(&url, query).await {
                Ok(body) if body.status().is_transient() => AttemptFailure {
                    error: AppError::ExternalLookup(body.describe()),
                    transient: true,
                },
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };

            if !failure.transient || attempt >= self.retry.max_attempts {
                tracing::warn!(
                    endpoint = %endpoint,
                    attempt,
                    error = %failure.error,
                    "Places request failed"
                );
                return Err(failure.error);
            }

            tracing::warn!(
                endpoint = %endpoint,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %failure.error,
                "Transient Places failure, retrying"
            );

            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
            attempt += 1;
        }
    }
}

#[async_trait::async_trait]
impl PlaceLookup for GooglePlacesProvider {
    async fn search_by_text(&self, query: &str) -> AppResult<Option<PlaceCandidate>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        self.ensure_api_key()?;

        let body: FindPlaceResponse = self
            .get(
                FIND_PLACE_ENDPOINT,
                &[
                    ("input", query),
                    ("inputtype", "textquery"),
                    ("fields", SEARCH_FIELDS),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;

        let candidate = match body.status {
            PlacesStatus::Ok => body
                .candidates
                .into_iter()
                .next()
                .map(PlaceCandidate::try_from)
                .transpose()?,
            PlacesStatus::ZeroResults => None,
            _ => return Err(AppError::ExternalLookup(body.describe())),
        };

        tracing::info!(
            query = %query,
            found = candidate.is_some(),
            provider = "google_places",
            "Place search completed"
        );

        Ok(candidate)
    }

    async fn fetch_details(&self, place_id: &str) -> AppResult<PlaceDetails> {
        self.ensure_api_key()?;

        let body: PlaceDetailsResponse = self
            .get(
                DETAILS_ENDPOINT,
                &[
                    ("place_id", place_id),
                    ("fields", DETAIL_FIELDS),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;

        if body.status != PlacesStatus::Ok {
            return Err(AppError::ExternalLookup(body.describe()));
        }

        let details = body.result.ok_or_else(|| {
            AppError::ExternalLookup("Places details response has no result".to_string())
        })?;

        tracing::info!(
            place_id = %place_id,
            has_opening_hours = details.opening_hours.is_some(),
            provider = "google_places",
            "Place details fetched"
        );

        Ok(details)
    }
}

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::OpeningHours;

/// Best match returned by a text search, not yet a venue
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    /// Fractional rating, when the service has one
    pub rating: Option<f64>,
}

/// Volatile venue metadata returned by a details lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaceDetails {
    pub opening_hours: Option<OpeningHours>,
    pub website: Option<String>,
    pub international_phone_number: Option<String>,
}

// ============================================================================
// Google Places API Types
// ============================================================================

/// Response status reported inside every Places API body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    NotFound,
    UnknownError,
    #[serde(other)]
    Other,
}

impl PlacesStatus {
    /// Whether the same request may succeed when repeated later
    pub fn is_transient(&self) -> bool {
        matches!(self, PlacesStatus::OverQueryLimit | PlacesStatus::UnknownError)
    }
}

/// Raw candidate from `findplacefromtext`
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCandidate {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl TryFrom<GoogleCandidate> for PlaceCandidate {
    type Error = AppError;

    fn try_from(raw: GoogleCandidate) -> AppResult<Self> {
        let missing = |field: &str| {
            AppError::ExternalLookup(format!("Places candidate is missing {}", field))
        };

        Ok(PlaceCandidate {
            place_id: raw
                .place_id
                .filter(|s| !s.is_empty())
                .ok_or_else(|| missing("place_id"))?,
            name: raw
                .name
                .filter(|s| !s.is_empty())
                .ok_or_else(|| missing("name"))?,
            formatted_address: raw
                .formatted_address
                .filter(|s| !s.is_empty())
                .ok_or_else(|| missing("formatted_address"))?,
            rating: raw.rating,
        })
    }
}

/// Body of a `findplacefromtext` response
#[derive(Debug, Deserialize)]
pub struct FindPlaceResponse {
    #[serde(default)]
    pub candidates: Vec<GoogleCandidate>,
    pub status: PlacesStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Body of a `details` response
#[derive(Debug, Deserialize)]
pub struct PlaceDetailsResponse {
    #[serde(default)]
    pub result: Option<PlaceDetails>,
    pub status: PlacesStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

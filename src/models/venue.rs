use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha1::{Digest, Sha1};

use crate::error::{AppError, AppResult};
use crate::models::PlaceDetails;

/// Highest rating a venue can carry
pub const MAX_RATING: u8 = 5;

/// Derives the venue id from its name and address
///
/// SHA-1 over `name + address`, URL-safe base64 with padding, matching the ids
/// already present in existing data directories. The same pair always yields
/// the same id; two venues with identical name and address collide.
pub fn generate_venue_id(name: &str, address: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(name.as_bytes());
    hasher.update(address.as_bytes());
    URL_SAFE.encode(hasher.finalize())
}

/// Whether `id` is usable as a venue file name.
///
/// Accepts the URL-safe base64 alphabet.
pub fn is_valid_venue_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='))
}

/// Rounds an external fractional rating into the venue range
pub fn rating_from_external(rating: f64) -> u8 {
    if !rating.is_finite() {
        return 0;
    }
    rating.round().clamp(0.0, f64::from(MAX_RATING)) as u8
}

/// Accepts `null` wherever a default value is expected.
///
/// Venue files written by the previous service encode empty lists as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Opening or closing point of a period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTime {
    /// Day of week, 0 = Sunday
    #[serde(default)]
    pub day: u8,
    /// Local 24-hour time as `HHMM`
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHoursPeriod {
    #[serde(default)]
    pub open: DayTime,
    /// Absent for venues open around the clock
    #[serde(default)]
    pub close: DayTime,
}

/// Weekly opening hours as reported by the place lookup service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub periods: Vec<OpeningHoursPeriod>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weekday_text: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanently_closed: Option<bool>,
}

/// A place to eat, as persisted in the venue store.
///
/// Field names on the wire match the files written by earlier versions of the
/// service, so existing data directories load unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Venue {
    #[serde(rename = "VenueID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Rating")]
    pub rating: u8,
    /// Empty for venues entered by hand
    #[serde(rename = "GooglePlaceID")]
    pub place_id: String,
    #[serde(rename = "OpeningHours", deserialize_with = "null_as_default")]
    pub opening_hours: OpeningHours,
    #[serde(rename = "OpeningHoursText", deserialize_with = "null_as_default")]
    pub opening_hours_text: Vec<String>,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "Notes")]
    pub notes: String,
    /// Append-only; the last entry is the most recent visit
    #[serde(rename = "Visits", deserialize_with = "null_as_default")]
    pub visits: Vec<DateTime<Utc>>,
}

impl Venue {
    /// Creates a manually entered venue with its id already derived
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        let mut venue = Self {
            name: name.into(),
            address: address.into(),
            ..Self::default()
        };
        venue.assign_id();
        venue
    }

    /// Recomputes the id from the current name and address
    pub fn assign_id(&mut self) {
        self.id = generate_venue_id(&self.name, &self.address);
    }

    /// Checks the invariants a venue must hold before it is persisted
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput("Venue name cannot be empty".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Venue address cannot be empty".to_string(),
            ));
        }
        if self.rating > MAX_RATING {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between 0 and {}, got {}",
                MAX_RATING, self.rating
            )));
        }
        Ok(())
    }

    pub fn is_visited(&self) -> bool {
        !self.visits.is_empty()
    }

    /// Most recently appended visit
    pub fn last_visit(&self) -> Option<&DateTime<Utc>> {
        self.visits.last()
    }

    /// Merges refreshed lookup details.
    ///
    /// Only opening hours, website and phone number are touched; visits and
    /// notes belong to the user.
    pub fn apply_details(&mut self, details: PlaceDetails) {
        let opening_hours = details.opening_hours.unwrap_or_default();
        self.opening_hours_text = opening_hours.weekday_text.clone();
        self.opening_hours = opening_hours;
        self.website = details.website.unwrap_or_default();
        self.phone_number = details.international_phone_number.unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_generate_venue_id_is_deterministic() {
        let a = generate_venue_id("Pizzeria Roma", "Hauptstrasse 1, Berlin");
        let b = generate_venue_id("Pizzeria Roma", "Hauptstrasse 1, Berlin");
        assert_eq!(a, b);
        assert!(is_valid_venue_id(&a));
    }

    #[test]
    fn test_generate_venue_id_matches_existing_data_files() {
        assert_eq!(
            generate_venue_id("Curry Corner", "Market Square 2"),
            "5nYgvljyciibeFQcSYcikSkttQk="
        );
    }

    #[test]
    fn test_generate_venue_id_no_collisions() {
        let mut seen = HashSet::new();
        for i in 0..5000 {
            let id = generate_venue_id(&format!("Venue {}", i), &format!("Street {}", i % 97));
            assert!(seen.insert(id), "collision at input {}", i);
        }
    }

    #[test]
    fn test_venue_id_validation() {
        assert!(is_valid_venue_id("aGVsbG8td29ybGQ_-="));
        assert!(!is_valid_venue_id(""));
        assert!(!is_valid_venue_id("../etc/passwd"));
        assert!(!is_valid_venue_id("abc/def"));
        assert!(!is_valid_venue_id("abc.json"));
    }

    #[test]
    fn test_rating_from_external() {
        assert_eq!(rating_from_external(4.4), 4);
        assert_eq!(rating_from_external(4.5), 5);
        assert_eq!(rating_from_external(7.2), 5);
        assert_eq!(rating_from_external(-1.0), 0);
        assert_eq!(rating_from_external(f64::NAN), 0);
    }

    #[test]
    fn test_validate_rejects_bad_venues() {
        assert!(Venue::new("Thai Garden", "Elm St 4").validate().is_ok());
        assert!(Venue::new("  ", "Elm St 4").validate().is_err());
        assert!(Venue::new("Thai Garden", "").validate().is_err());

        let mut venue = Venue::new("Thai Garden", "Elm St 4");
        venue.rating = 6;
        assert!(matches!(venue.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_deserialize_legacy_document_with_nulls() {
        let json = r#"{
            "VenueID": "abc=",
            "Name": "Curry Corner",
            "Address": "Market Square 2",
            "Rating": 4,
            "GooglePlaceID": "",
            "OpeningHours": {"open_now": null, "periods": null, "weekday_text": null, "permanently_closed": null},
            "OpeningHoursText": null,
            "Website": "",
            "PhoneNumber": "",
            "Notes": "try the lunch menu",
            "Visits": null
        }"#;

        let venue: Venue = serde_json::from_str(json).unwrap();
        assert_eq!(venue.name, "Curry Corner");
        assert_eq!(venue.rating, 4);
        assert!(venue.visits.is_empty());
        assert!(venue.opening_hours.periods.is_empty());
        assert_eq!(venue.notes, "try the lunch menu");
    }

    #[test]
    fn test_serialize_uses_legacy_field_names() {
        let mut venue = Venue::new("Sushi Bar", "Harbor 9");
        venue
            .visits
            .push(Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap());

        let value = serde_json::to_value(&venue).unwrap();
        for field in [
            "VenueID",
            "Name",
            "Address",
            "Rating",
            "GooglePlaceID",
            "OpeningHours",
            "OpeningHoursText",
            "Website",
            "PhoneNumber",
            "Notes",
            "Visits",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(value["Visits"][0], "2024-03-01T19:30:00Z");
    }

    #[test]
    fn test_apply_details_keeps_user_fields() {
        let mut venue = Venue::new("Sushi Bar", "Harbor 9");
        venue.notes = "ask for the counter".to_string();
        venue
            .visits
            .push(Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap());
        let before = venue.clone();

        venue.apply_details(PlaceDetails {
            opening_hours: Some(OpeningHours {
                open_now: None,
                periods: vec![OpeningHoursPeriod {
                    open: DayTime { day: 1, time: "1130".to_string() },
                    close: DayTime { day: 1, time: "2200".to_string() },
                }],
                weekday_text: vec!["Monday: 11:30 AM – 10:00 PM".to_string()],
                permanently_closed: None,
            }),
            website: Some("https://sushi.example".to_string()),
            international_phone_number: Some("+49 30 123456".to_string()),
        });

        assert_eq!(venue.notes, before.notes);
        assert_eq!(venue.visits, before.visits);
        assert_eq!(venue.id, before.id);
        assert_eq!(venue.website, "https://sushi.example");
        assert_eq!(venue.phone_number, "+49 30 123456");
        assert_eq!(venue.opening_hours.periods.len(), 1);
        assert_eq!(venue.opening_hours_text, vec!["Monday: 11:30 AM – 10:00 PM"]);
    }
}

use crate::{
    error::AppResult,
    models::{rating_from_external, Venue},
    services::providers::PlaceLookup,
};

/// Builds a venue from the best place lookup match for `query`.
///
/// Search, then fetch and merge the details, then derive the id from the final
/// name and address. The venue is returned unsaved; `Ok(None)` when the search
/// found nothing.
pub async fn acquire_venue_from_search(
    lookup: &dyn PlaceLookup,
    query: &str,
) -> AppResult<Option<Venue>> {
    let Some(candidate) = lookup.search_by_text(query).await? else {
        tracing::info!(query = %query, "No place matches the search");
        return Ok(None);
    };

    let mut venue = Venue {
        name: candidate.name,
        address: candidate.formatted_address,
        rating: candidate.rating.map(rating_from_external).unwrap_or(0),
        place_id: candidate.place_id,
        ..Venue::default()
    };

    let details = lookup.fetch_details(&venue.place_id).await?;
    venue.apply_details(details);
    venue.assign_id();

    tracing::info!(
        query = %query,
        venue_id = %venue.id,
        place_id = %venue.place_id,
        "Venue acquired from place search"
    );

    Ok(Some(venue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{generate_venue_id, PlaceCandidate, PlaceDetails};
    use crate::services::providers::MockPlaceLookup;

    fn candidate() -> PlaceCandidate {
        PlaceCandidate {
            place_id: "ChIJbistro".to_string(),
            name: "Corner Bistro".to_string(),
            formatted_address: "331 W 4th St, New York".to_string(),
            rating: Some(4.6),
        }
    }

    #[tokio::test]
    async fn test_acquire_merges_search_and_details() {
        let mut lookup = MockPlaceLookup::new();
        lookup
            .expect_search_by_text()
            .times(1)
            .returning(|_| Ok(Some(candidate())));
        lookup
            .expect_fetch_details()
            .times(1)
            .returning(|place_id| {
                assert_eq!(place_id, "ChIJbistro");
                Ok(PlaceDetails {
                    opening_hours: None,
                    website: Some("https://cornerbistro.example".to_string()),
                    international_phone_number: Some("+1 212-555-0199".to_string()),
                })
            });

        let venue = acquire_venue_from_search(&lookup, "corner bistro")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(venue.name, "Corner Bistro");
        assert_eq!(venue.address, "331 W 4th St, New York");
        assert_eq!(venue.rating, 5);
        assert_eq!(venue.place_id, "ChIJbistro");
        assert_eq!(venue.website, "https://cornerbistro.example");
        assert_eq!(venue.phone_number, "+1 212-555-0199");
        assert_eq!(
            venue.id,
            generate_venue_id("Corner Bistro", "331 W 4th St, New York")
        );
        assert!(venue.visits.is_empty());
    }

    #[tokio::test]
    async fn test_acquire_without_candidate_is_empty() {
        let mut lookup = MockPlaceLookup::new();
        lookup
            .expect_search_by_text()
            .times(1)
            .returning(|_| Ok(None));
        lookup.expect_fetch_details().never();

        let venue = acquire_venue_from_search(&lookup, "does not exist").await.unwrap();
        assert_eq!(venue, None);
    }

    #[tokio::test]
    async fn test_acquire_propagates_detail_failures() {
        let mut lookup = MockPlaceLookup::new();
        lookup
            .expect_search_by_text()
            .returning(|_| Ok(Some(candidate())));
        lookup
            .expect_fetch_details()
            .returning(|_| Err(AppError::ExternalLookup("timeout".to_string())));

        let result = acquire_venue_from_search(&lookup, "corner bistro").await;
        assert!(matches!(result, Err(AppError::ExternalLookup(_))));
    }

    #[tokio::test]
    async fn test_acquire_without_rating_defaults_to_zero() {
        let mut lookup = MockPlaceLookup::new();
        lookup.expect_search_by_text().returning(|_| {
            Ok(Some(PlaceCandidate {
                rating: None,
                ..candidate()
            }))
        });
        lookup
            .expect_fetch_details()
            .returning(|_| Ok(PlaceDetails::default()));

        let venue = acquire_venue_from_search(&lookup, "bistro")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(venue.rating, 0);
    }
}

mod ordering;
mod place;
mod venue;

pub use ordering::SortKey;
pub use place::{
    FindPlaceResponse, GoogleCandidate, PlaceCandidate, PlaceDetails, PlaceDetailsResponse,
    PlacesStatus,
};
pub use venue::{
    generate_venue_id, is_valid_venue_id, rating_from_external, DayTime, OpeningHours,
    OpeningHoursPeriod, Venue, MAX_RATING,
};

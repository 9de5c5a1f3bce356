use std::cmp::Ordering;

use super::Venue;

/// Sort orders offered by the venue listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    NameDesc,
    Rating,
    RatingDesc,
}

impl SortKey {
    /// Parses the `sortby` query value; anything unrecognized sorts by name
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("name-desc") => SortKey::NameDesc,
            Some("rating") => SortKey::Rating,
            Some("rating-desc") => SortKey::RatingDesc,
            _ => SortKey::Name,
        }
    }

    pub fn compare(self, a: &Venue, b: &Venue) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::NameDesc => b.name.cmp(&a.name),
            SortKey::Rating => a.rating.cmp(&b.rating),
            SortKey::RatingDesc => b.rating.cmp(&a.rating),
        }
    }

    /// Stable sort: venues with equal keys keep their input order
    pub fn sort(self, venues: &mut [Venue]) {
        venues.sort_by(|a, b| self.compare(a, b));
    }
}

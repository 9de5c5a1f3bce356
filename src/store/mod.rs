mod locks;
mod venue_store;

pub use locks::VenueLock;
pub use venue_store::VenueStore;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{generate_venue_id, Venue},
    store::VenueStore,
};

/// Validates a new venue, derives its id and persists it.
///
/// An existing venue with the same name and address is overwritten.
pub async fn create_venue(store: &VenueStore, mut venue: Venue) -> AppResult<Venue> {
    venue.validate()?;
    venue.assign_id();

    let _guard = store.lock(&venue.id).await;
    store.save(&venue).await?;

    tracing::info!(venue_id = %venue.id, name = %venue.name, "Venue created");

    Ok(venue)
}

/// Replaces every field of an existing venue except its id
pub async fn update_venue(store: &VenueStore, id: &str, mut venue: Venue) -> AppResult<Venue> {
    venue.validate()?;

    let _guard = store.lock(id).await;
    if !store.exists(id).await? {
        return Err(AppError::NotFound(format!("Venue {}", id)));
    }

    venue.id = id.to_string();
    store.save(&venue).await?;

    tracing::info!(venue_id = %id, "Venue updated");

    Ok(venue)
}

/// Changes name and address, moving the venue to its newly derived id.
///
/// Fails with a conflict when another venue already lives at the new id.
pub async fn rename_venue(
    store: &VenueStore,
    id: &str,
    name: String,
    address: String,
) -> AppResult<Venue> {
    let new_id = generate_venue_id(&name, &address);
    let _guards = store.lock_many(&[id, new_id.as_str()]).await;

    let mut venue = store.load(id).await?;
    venue.name = name;
    venue.address = address;
    venue.validate()?;

    if new_id == id {
        store.save(&venue).await?;
        return Ok(venue);
    }

    if store.exists(&new_id).await? {
        return Err(AppError::Conflict(format!(
            "Venue {} already exists",
            new_id
        )));
    }

    venue.id = new_id;
    move_record(store, &venue, id).await?;

    tracing::info!(old_id = %id, venue_id = %venue.id, "Venue renamed");

    Ok(venue)
}

/// Saves `venue` under its new id and removes the record at `old_id`.
///
/// If the old record cannot be removed the new one is deleted again, so a
/// failed rename does not leave the venue stored twice. Callers hold both locks.
async fn move_record(store: &VenueStore, venue: &Venue, old_id: &str) -> AppResult<()> {
    store.save(venue).await?;

    if let Err(e) = store.delete(old_id).await {
        if let Err(cleanup) = store.delete(&venue.id).await {
            tracing::warn!(
                venue_id = %venue.id,
                error = %cleanup,
                "Failed to roll back renamed venue"
            );
        }
        return Err(e);
    }

    Ok(())
}

/// Appends visits in the given order
pub async fn add_visits(
    store: &VenueStore,
    id: &str,
    visits: Vec<DateTime<Utc>>,
) -> AppResult<Venue> {
    let _guard = store.lock(id).await;
    let mut venue = store.load(id).await?;

    let added = visits.len();
    venue.visits.extend(visits);
    store.save(&venue).await?;

    tracing::info!(venue_id = %id, added, total = venue.visits.len(), "Visits added");

    Ok(venue)
}

pub async fn delete_venue(store: &VenueStore, id: &str) -> AppResult<()> {
    let _guard = store.lock(id).await;
    store.delete(id).await?;

    tracing::info!(venue_id = %id, "Venue deleted");

    Ok(())
}

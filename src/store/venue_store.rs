use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{is_valid_venue_id, Venue};

use super::locks::{KeyedLocks, VenueLock};

const RECORD_EXTENSION: &str = "json";

/// File-backed venue store: one `<id>.json` file per venue under `root`
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the record, so readers never see a partially written venue. Saves are
/// unconditional (last writer wins); callers doing read-modify-write take
/// [`VenueStore::lock`] first.
#[derive(Clone)]
pub struct VenueStore {
    root: PathBuf,
    locks: Arc<KeyedLocks>,
}

impl VenueStore {
    /// Opens the store, creating the root directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        tracing::info!(root = %root.display(), "Venue store opened");

        Ok(Self {
            root,
            locks: Arc::new(KeyedLocks::default()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serializes exclusive access to one venue id
    pub async fn lock(&self, id: &str) -> VenueLock {
        self.locks.acquire(id).await
    }

    /// Locks several ids at once, always in sorted order so that two callers
    /// locking the same pair cannot deadlock
    pub async fn lock_many(&self, ids: &[&str]) -> Vec<VenueLock> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.locks.acquire(id).await);
        }
        guards
    }

    fn record_path(&self, id: &str) -> AppResult<PathBuf> {
        if !is_valid_venue_id(id) {
            return Err(AppError::InvalidInput(format!("Invalid venue id: {:?}", id)));
        }
        Ok(self.root.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Writes the venue to its id-derived path, replacing any previous version
    pub async fn save(&self, venue: &Venue) -> AppResult<()> {
        let path = self.record_path(&venue.id)?;

        let mut bytes = serde_json::to_vec(venue)
            .map_err(|e| AppError::Internal(format!("Venue serialization error: {}", e)))?;
        bytes.push(b'\n');

        let temp_path = self
            .root
            .join(format!(".{}.{}.tmp", venue.id, Uuid::new_v4().simple()));

        if let Err(e) = write_then_rename(&temp_path, &path, &bytes).await {
            // a failed write may still have created a partial temp file
            let _ = fs::remove_file(&temp_path).await;
            tracing::warn!(venue_id = %venue.id, error = %e, "Venue save failed");
            return Err(e.into());
        }

        tracing::debug!(venue_id = %venue.id, bytes = bytes.len(), "Venue saved");

        Ok(())
    }

    pub async fn load(&self, id: &str) -> AppResult<Venue> {
        let path = self.record_path(id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("Venue {}", id)));
            }
            Err(e) => return Err(e.into()),
        };

        let mut venue = decode_record(&path, &bytes)?;
        if venue.id.is_empty() {
            venue.id = id.to_string();
        }
        Ok(venue)
    }

    pub async fn exists(&self, id: &str) -> AppResult<bool> {
        let path = self.record_path(id)?;
        Ok(fs::try_exists(&path).await?)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(venue_id = %id, "Venue deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Venue {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads every venue in the store, ordered by file name.
    ///
    /// Subdirectories and files without the record extension are ignored. The
    /// first record that cannot be read or decoded aborts the listing.
    pub async fn list_all(&self) -> AppResult<Vec<Venue>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut venues = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).await?;
            let mut venue = decode_record(&path, &bytes)?;
            if venue.id.is_empty() {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    venue.id = stem.to_string();
                }
            }
            venues.push(venue);
        }

        tracing::debug!(count = venues.len(), "Venues listed");

        Ok(venues)
    }
}

async fn write_then_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(temp_path, bytes).await?;
    fs::rename(temp_path, path).await
}

fn decode_record(path: &Path, bytes: &[u8]) -> AppResult<Venue> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::Decode(format!("{}: {}", path.display(), e)))
}

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Listing, ListingPatch};

/// Errors that can occur in a listing repository
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Listing not found: {0}")]
    NotFound(Uuid),

    #[error("Concurrent modification of listing {0}")]
    Conflict(Uuid),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Persistence port for listings.
///
/// `update` is a read-modify-write that must hold the storage layer's row
/// lock while applying the patch, so a reader never sees attributes from one
/// write paired with tags from another.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a fully-formed listing (tags already derived).
    async fn insert(&self, listing: Listing) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepositoryError>;
    /// Apply `patch` under the row lock via [`Listing::apply_patch`] and
    /// return the stored result.
    async fn update(&self, id: Uuid, patch: ListingPatch) -> Result<Listing, RepositoryError>;
    /// Delete by id. Returns true if a listing was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
    /// Consistent snapshot in insertion order
    async fn snapshot(&self, active_only: bool) -> Result<Vec<Listing>, RepositoryError>;
    /// Recompute tags for every stored listing, under the same locking as
    /// `update`. Returns how many listings had stale tags.
    async fn retag_all(&self) -> Result<usize, RepositoryError>;
    async fn health_check(&self) -> Result<bool, RepositoryError>;
}

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Listing, ListingPatch};
use crate::services::repository::{ListingRepository, RepositoryError};

/// In-process listing store
///
/// Keeps listings in insertion order. Every write holds the write lock for
/// its whole read-modify-write, so readers only ever see committed pairs of
/// attributes and tags.
#[derive(Default)]
pub struct InMemoryRepository {
    listings: RwLock<Vec<Listing>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: RwLock::new(listings),
        }
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }
}

#[async_trait]
impl ListingRepository for InMemoryRepository {
    async fn insert(&self, listing: Listing) -> Result<(), RepositoryError> {
        let mut listings = self.listings.write().await;
        tracing::debug!("Inserting listing {} ({} tags)", listing.id, listing.tags.len());
        listings.push(listing);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepositoryError> {
        let listings = self.listings.read().await;
        Ok(listings.iter().find(|l| l.id == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: ListingPatch) -> Result<Listing, RepositoryError> {
        let mut listings = self.listings.write().await;
        let listing = listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(RepositoryError::NotFound(id))?;

        listing.apply_patch(patch, Utc::now());
        Ok(listing.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut listings = self.listings.write().await;
        let before = listings.len();
        listings.retain(|l| l.id != id);
        Ok(listings.len() < before)
    }

    async fn snapshot(&self, active_only: bool) -> Result<Vec<Listing>, RepositoryError> {
        let listings = self.listings.read().await;
        Ok(listings
            .iter()
            .filter(|l| !active_only || l.attributes.is_active)
            .cloned()
            .collect())
    }

    async fn retag_all(&self) -> Result<usize, RepositoryError> {
        let mut listings = self.listings.write().await;
        let refreshed = listings
            .iter_mut()
            .map(|l| l.refresh_tags())
            .filter(|&changed| changed)
            .count();
        Ok(refreshed)
    }

    async fn health_check(&self) -> Result<bool, RepositoryError> {
        Ok(true)
    }
}

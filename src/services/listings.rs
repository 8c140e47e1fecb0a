use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::core::{derive_tags, validate_pagination, FacetEngine, ValidationError};
use crate::models::domain::canonical_city;
use crate::models::{ClassifyingAttributes, FilterRequest, FilterResult, Listing, ListingPatch, NewListing, TagSet};
use crate::services::cache::{CacheError, CacheKey, CacheManager};
use crate::services::repository::{ListingRepository, RepositoryError};

/// Errors surfaced by the listing service
#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Listing not found: {0}")]
    NotFound(Uuid),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ListingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ListingError::NotFound(id),
            other => ListingError::Repository(other),
        }
    }
}

/// Write and read paths for listings
///
/// Every write goes through here so that tags are derived explicitly and
/// persisted in the same repository call as the attributes. Searches run the
/// facet engine over a snapshot of active listings.
pub struct ListingService {
    repository: Arc<dyn ListingRepository>,
    cache: Option<Arc<CacheManager>>,
    engine: FacetEngine,
}

impl ListingService {
    pub fn new(
        repository: Arc<dyn ListingRepository>,
        cache: Option<Arc<CacheManager>>,
        engine: FacetEngine,
    ) -> Self {
        Self { repository, cache, engine }
    }

    pub fn engine(&self) -> &FacetEngine {
        &self.engine
    }

    /// Validate, derive tags and persist a new listing
    pub async fn create(&self, mut draft: NewListing) -> Result<Listing, ListingError> {
        draft.validate().map_err(ValidationError::from)?;
        draft.attributes.city = normalize_city(draft.attributes.city.take())?;

        let listing = Listing::new(draft, Utc::now());
        self.repository.insert(listing.clone()).await?;
        self.invalidate_searches().await;

        tracing::info!("Created listing {} with {} tags", listing.id, listing.tags.len());

        Ok(listing)
    }

    /// Apply a partial update; the repository re-derives tags under its row lock
    pub async fn update(&self, id: Uuid, mut patch: ListingPatch) -> Result<Listing, ListingError> {
        patch.validate().map_err(ValidationError::from)?;
        patch.city = normalize_city(patch.city.take())?;

        let listing = self.repository.update(id, patch).await?;
        self.invalidate_searches().await;

        tracing::info!("Updated listing {} (version {})", id, listing.version);

        Ok(listing)
    }

    /// Take a listing offline without deleting it
    pub async fn deactivate(&self, id: Uuid) -> Result<Listing, ListingError> {
        self.update(id, ListingPatch::deactivate()).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, ListingError> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            self.invalidate_searches().await;
            tracing::info!("Deleted listing {}", id);
        }
        Ok(deleted)
    }

    pub async fn get(&self, id: Uuid) -> Result<Listing, ListingError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ListingError::NotFound(id))
    }

    /// Run a facet query over the active listings
    pub async fn search(&self, request: &FilterRequest) -> Result<FilterResult, ListingError> {
        validate_pagination(request.page, request.page_size)?;

        // The generation is read before the snapshot so that a write landing
        // in between retires the key this result is stored under.
        let cache_key = match &self.cache {
            Some(cache) => match cache.search_generation().await {
                Ok(generation) => CacheKey::search(generation, request).ok(),
                Err(e) => {
                    tracing::warn!("Search cache generation unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            match cache.get::<FilterResult>(key).await {
                Ok(result) => return Ok(result),
                Err(CacheError::CacheMiss(_)) => {}
                Err(e) => tracing::warn!("Search cache read failed: {}", e),
            }
        }

        let snapshot = self.repository.snapshot(true).await?;
        let result = self.engine.query(snapshot, request)?;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Err(e) = cache.set(key, &result).await {
                tracing::warn!("Search cache write failed: {}", e);
            }
        }

        Ok(result)
    }

    /// Tags the given attributes would derive, without persisting anything.
    /// Attributes are validated exactly as on create.
    pub fn preview_tags(&self, mut attributes: ClassifyingAttributes) -> Result<TagSet, ListingError> {
        attributes.validate().map_err(ValidationError::from)?;
        attributes.city = normalize_city(attributes.city.take())?;

        Ok(derive_tags(&attributes))
    }

    /// Re-derive tags for every stored listing
    pub async fn retag_all(&self) -> Result<usize, ListingError> {
        let refreshed = self.repository.retag_all().await?;
        if refreshed > 0 {
            self.invalidate_searches().await;
        }
        Ok(refreshed)
    }

    pub async fn health_check(&self) -> bool {
        self.repository.health_check().await.unwrap_or(false)
    }

    async fn invalidate_searches(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_searches().await {
                tracing::warn!("Failed to invalidate search cache: {}", e);
            }
        }
    }
}

/// Map a city onto its canonical spelling, rejecting unknown cities
fn normalize_city(city: Option<String>) -> Result<Option<String>, ValidationError> {
    city.map(|c| {
        canonical_city(&c)
            .map(str::to_string)
            .ok_or(ValidationError::UnknownCity(c))
    })
    .transpose()
}

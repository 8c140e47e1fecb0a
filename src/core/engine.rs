use std::cmp::Ordering;

use crate::core::filters::matches_request;
use crate::core::validation::{validate_pagination, ValidationError};
use crate::models::{FilterRequest, FilterResult, Listing, SearchableField};

/// Fields searched by free text when nothing else is configured
pub const DEFAULT_SEARCHABLE_FIELDS: &[SearchableField] =
    &[SearchableField::Name, SearchableField::Description];

/// Facet query engine - filters, orders and paginates a listing snapshot
///
/// # Pipeline Stages
/// 1. Pagination validation
/// 2. Facet predicate (logical AND over supplied facets)
/// 3. Fixed-precedence stable sort
/// 4. Page slicing
#[derive(Debug, Clone)]
pub struct FacetEngine {
    searchable: Vec<SearchableField>,
}

impl FacetEngine {
    pub fn new(searchable: Vec<SearchableField>) -> Self {
        if searchable.is_empty() {
            return Self::with_default_fields();
        }
        Self { searchable }
    }

    pub fn with_default_fields() -> Self {
        Self {
            searchable: DEFAULT_SEARCHABLE_FIELDS.to_vec(),
        }
    }

    pub fn searchable_fields(&self) -> &[SearchableField] {
        &self.searchable
    }

    /// Evaluate a filter request against a snapshot of listings
    ///
    /// # Arguments
    /// * `listings` - The snapshot, in insertion order
    /// * `request` - Facets and pagination
    ///
    /// # Returns
    /// The requested page, or a validation error for non-positive pagination.
    /// A page past the end is empty, not an error.
    pub fn query(
        &self,
        listings: Vec<Listing>,
        request: &FilterRequest,
    ) -> Result<FilterResult, ValidationError> {
        let (page, page_size) = validate_pagination(request.page, request.page_size)?;
        let scanned = listings.len();

        let mut matched: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| matches_request(listing, request, &self.searchable))
            .collect();

        // Vec::sort_by is stable: remaining ties keep snapshot order
        matched.sort_by(compare_listings);

        let total = matched.len();
        let pages = total.div_ceil(page_size);
        let offset = (page - 1).saturating_mul(page_size);

        let items: Vec<Listing> = matched
            .into_iter()
            .skip(offset)
            .take(page_size)
            .collect();

        tracing::debug!(
            "Facet query matched {} of {} listings, returning page {}/{} ({} items)",
            total,
            scanned,
            page,
            pages,
            items.len()
        );

        Ok(FilterResult {
            items,
            total,
            pages,
            current_page: page,
        })
    }
}

impl Default for FacetEngine {
    fn default() -> Self {
        Self::with_default_fields()
    }
}

/// Online first, then verified, then rating (desc), then newest first
pub fn compare_listings(a: &Listing, b: &Listing) -> Ordering {
    b.is_online
        .cmp(&a.is_online)
        .then_with(|| b.attributes.is_verified.cmp(&a.attributes.is_verified))
        .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

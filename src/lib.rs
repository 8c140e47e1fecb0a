//! Listing Facets - tag derivation and faceted search for classified listings
//!
//! Every listing carries a set of tags derived from its classifying attributes
//! (nationality, hair colour, services, age, price, city, body type and
//! status). Tags are recomputed on every write and drive the faceted search
//! over active listings.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{derive_tags, FacetEngine, ValidationError};
pub use models::{ClassifyingAttributes, FilterRequest, FilterResult, Listing, SearchParams, TagSet};
pub use services::{InMemoryRepository, ListingRepository, ListingService};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let tags = derive_tags(&ClassifyingAttributes {
            is_active: true,
            ..Default::default()
        });
        assert!(tags.contains("Disponível"));
        assert!(FacetEngine::default().searchable_fields().len() >= 1);
    }
}

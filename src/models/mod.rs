// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ClassifyingAttributes, HairColor, Listing, Nationality, SearchableField, Service, TagSet, KNOWN_CITIES};
pub use requests::{ClearableField, FilterRequest, ListingPatch, NewListing, PageDefaults, SearchParams};
pub use responses::{DeleteResponse, ErrorResponse, FilterResult, HealthResponse, TagPreviewResponse};

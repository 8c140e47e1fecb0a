// Core algorithm exports
pub mod engine;
pub mod filters;
pub mod tags;
pub mod validation;

pub use engine::{compare_listings, FacetEngine, DEFAULT_SEARCHABLE_FIELDS};
pub use filters::{matches_age, matches_city, matches_price, matches_request, matches_tags, matches_text};
pub use tags::{calculate_bmi, derive_rule, derive_tags, rule_names, TAG_RULES};
pub use validation::{validate_pagination, ValidationError};

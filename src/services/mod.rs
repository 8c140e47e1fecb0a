// Service exports
pub mod cache;
pub mod listings;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use listings::{ListingError, ListingService};
pub use memory::InMemoryRepository;
pub use postgres::PostgresClient;
pub use repository::{ListingRepository, RepositoryError};

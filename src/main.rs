use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use listing_facets::config::{LoggingSettings, Settings};
use listing_facets::core::FacetEngine;
use listing_facets::routes::{self, listings::AppState};
use listing_facets::services::{
    CacheManager, InMemoryRepository, ListingRepository, ListingService, PostgresClient,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// RUST_LOG wins over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| io_error("Configuration error", e))?;

    init_tracing(&settings.logging);

    info!("Starting listing search service...");

    // Listing storage: PostgreSQL when configured, process memory otherwise
    let repository: Arc<dyn ListingRepository> = match &settings.database {
        Some(db) => {
            let postgres = PostgresClient::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io_error("PostgreSQL connection error", e)
            })?;

            info!("PostgreSQL repository initialized (max: {} connections)", db.max_connections.unwrap_or(10));
            Arc::new(postgres)
        }
        None => {
            info!("No database configured, keeping listings in memory");
            Arc::new(InMemoryRepository::new())
        }
    };

    // Search result cache, only when enabled
    let cache = if settings.cache.enabled {
        let cache_ttl = settings.cache.ttl_secs.unwrap_or(60);
        let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

        let cache = match &settings.cache.redis_url {
            Some(redis_url) => CacheManager::new(redis_url, l1_cache_size, cache_ttl)
                .await
                .map_err(|e| {
                    error!("Failed to connect to Redis: {}", e);
                    io_error("Redis connection required when cache is enabled", e)
                })?,
            None => {
                info!("No Redis configured, search cache is process-local");
                CacheManager::local(l1_cache_size, cache_ttl)
            }
        };

        info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
        Some(Arc::new(cache))
    } else {
        info!("Search cache disabled");
        None
    };

    let engine = FacetEngine::new(settings.search.searchable_fields.clone());

    info!("Facet engine searching fields: {:?}", engine.searchable_fields());

    let app_state = AppState {
        service: Arc::new(ListingService::new(repository, cache, engine)),
        page_defaults: settings.search.page_defaults(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    ClassifyingAttributes, DeleteResponse, ErrorResponse, HealthResponse, ListingPatch, NewListing,
    PageDefaults, SearchParams, TagPreviewResponse,
};
use crate::services::{ListingError, ListingService};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ListingService>,
    pub page_defaults: PageDefaults,
}

/// Configure all listing-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        // search must be registered before the {id} routes
        .route("/listings/search", web::get().to(search_listings))
        .route("/listings", web::get().to(search_listings))
        .route("/listings", web::post().to(create_listing))
        .route("/listings/{id}", web::get().to(get_listing))
        .route("/listings/{id}", web::patch().to(update_listing))
        .route("/listings/{id}", web::delete().to(delete_listing))
        .route("/listings/{id}/deactivate", web::post().to(deactivate_listing))
        .route("/tags/preview", web::post().to(preview_tags))
        .route("/admin/retag", web::post().to(retag_listings));
}

fn error_response(err: ListingError) -> HttpResponse {
    match err {
        ListingError::Validation(e) => {
            tracing::info!("Rejected request: {}", e);
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: e.to_string(),
                status_code: 400,
            })
        }
        ListingError::NotFound(id) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Listing not found".to_string(),
            message: format!("No listing with id {}", id),
            status_code: 404,
        }),
        ListingError::Repository(e) => {
            tracing::error!("Repository failure: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Storage error".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.service.health_check().await;
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Search endpoint (also serves the directory listing)
///
/// GET /api/v1/listings/search?q=&city=&tags=Loira,VIP&minPrice=&maxPrice=&minAge=&maxAge=&isVerified=&isOnline=&page=&pageSize=
///
/// Response body:
/// ```json
/// { "items": [], "total": 0, "pages": 0, "currentPage": 1 }
/// ```
async fn search_listings(
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> HttpResponse {
    let request = match query.into_inner().into_filter_request(state.page_defaults) {
        Ok(request) => request,
        Err(e) => return error_response(ListingError::Validation(e)),
    };

    tracing::debug!("Searching listings: {:?}", request);

    match state.service.search(&request).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(e),
    }
}

/// Create listing endpoint
///
/// POST /api/v1/listings
async fn create_listing(
    state: web::Data<AppState>,
    req: web::Json<NewListing>,
) -> HttpResponse {
    match state.service.create(req.into_inner()).await {
        Ok(listing) => HttpResponse::Created().json(listing),
        Err(e) => error_response(e),
    }
}

async fn get_listing(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    match state.service.get(path.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => error_response(e),
    }
}

/// Update listing endpoint
///
/// PATCH /api/v1/listings/{id}
///
/// Any classifying attribute in the body triggers a full tag recomputation.
async fn update_listing(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<ListingPatch>,
) -> HttpResponse {
    match state.service.update(path.into_inner(), req.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => error_response(e),
    }
}

async fn delete_listing(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    match state.service.delete(id).await {
        Ok(true) => HttpResponse::Ok().json(DeleteResponse {
            success: true,
            id: id.to_string(),
        }),
        Ok(false) => error_response(ListingError::NotFound(id)),
        Err(e) => error_response(e),
    }
}

async fn deactivate_listing(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    match state.service.deactivate(path.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => error_response(e),
    }
}

/// Tag preview endpoint
///
/// POST /api/v1/tags/preview
///
/// Returns the tags the posted attributes would derive. Nothing is stored;
/// invalid attributes are rejected with 400 as on create.
async fn preview_tags(
    state: web::Data<AppState>,
    req: web::Json<ClassifyingAttributes>,
) -> HttpResponse {
    match state.service.preview_tags(req.into_inner()) {
        Ok(tags) => HttpResponse::Ok().json(TagPreviewResponse {
            count: tags.len(),
            tags,
        }),
        Err(e) => error_response(e),
    }
}

async fn retag_listings(state: web::Data<AppState>) -> HttpResponse {
    match state.service.retag_all().await {
        Ok(refreshed) => HttpResponse::Ok().json(serde_json::json!({ "refreshed": refreshed })),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FacetEngine;
    use crate::models::FilterResult;
    use crate::services::InMemoryRepository;
    use actix_web::{http::StatusCode, test, App};

    fn state() -> AppState {
        AppState {
            service: Arc::new(ListingService::new(
                Arc::new(InMemoryRepository::new()),
                None,
                FacetEngine::default(),
            )),
            page_defaults: PageDefaults::default(),
        }
    }

    #[actix_web::test]
    async fn test_create_then_search_by_tags() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        for (name, price) in [("Clara", 250.0), ("Bia", 90.0)] {
            let req = test::TestRequest::post()
                .uri("/api/v1/listings")
                .set_json(serde_json::json!({
                    "name": name,
                    "hairColor": "Loira",
                    "age": 23,
                    "price": price,
                    "city": "Lisboa",
                }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/listings/search?tags=Loira,VIP")
            .to_request();
        let result: FilterResult = test::call_and_read_body_json(&app, req).await;

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].name, "Clara");
        assert_eq!(result.current_page, 1);
    }

    #[actix_web::test]
    async fn test_malformed_range_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/listings/search?minPrice=abc&maxPrice=200")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/listings?page=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_unknown_listing_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/listings/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_preview_tags() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/tags/preview")
            .set_json(serde_json::json!({ "price": 600.0, "isActive": false }))
            .to_request();
        let preview: TagPreviewResponse = test::call_and_read_body_json(&app, req).await;

        assert!(preview.tags.contains("VIP"));
        assert!(preview.tags.contains("Elite"));
        assert_eq!(preview.count, 5);
    }

    #[actix_web::test]
    async fn test_preview_rejects_invalid_attributes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let bodies = [
            serde_json::json!({ "age": 12, "price": 150.0 }),
            serde_json::json!({ "city": "Gotham" }),
            serde_json::json!({ "age": 12, "price": -50.0, "city": "Gotham", "heightCm": 10, "weightKg": 5 }),
        ];

        for body in bodies {
            let req = test::TestRequest::post()
                .uri("/api/v1/tags/preview")
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", body);
        }
    }
}

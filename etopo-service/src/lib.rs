//! ETOPO Service Library
//!
//! HTTP handlers, router and types for the batched elevation service.
//! This library is used by both the etopo-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use etopo::LookupService;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the ETOPO service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ETOPO Elevation Service",
        version = "0.1.0",
        description = "Batched elevation lookup over the ETOPO1 global relief model.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_elevations,
        handlers::health_check,
        handlers::get_dataset,
    ),
    components(
        schemas(
            handlers::ApiResponse,
            handlers::ApiStatus,
            handlers::ElevationResult,
            handlers::Location,
            handlers::HealthResponse,
            handlers::DatasetResponse,
        )
    ),
    tags(
        (name = "elevation", description = "Elevation query endpoints"),
        (name = "system", description = "System and dataset endpoints")
    )
)]
pub struct ApiDoc;

/// Default bound on a single lookup request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across handlers.
pub struct AppState {
    /// Elevation lookup over the shard directory.
    pub lookup_service: LookupService,
    /// Upper bound on the time spent serving one lookup.
    pub request_timeout: Duration,
}

impl AppState {
    /// Create state with the default request timeout.
    pub fn new(lookup_service: LookupService) -> Self {
        Self {
            lookup_service,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Build the API router.
///
/// Serves the lookup API, the auxiliary endpoints and the Swagger UI. Every
/// response carries the fixed set of security headers.
pub fn router(state: Arc<AppState>) -> Router {
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("deny"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        ));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/json", get(handlers::get_elevations))
        .route("/health", get(handlers::health_check))
        .route("/dataset", get(handlers::get_dataset))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(security_headers)
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use handlers::{
    ApiResponse, ApiStatus, DatasetResponse, ElevationResult, HealthResponse, Location,
    LocationsQuery,
};

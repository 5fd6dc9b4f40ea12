//! HTTP request handlers for the elevation service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use etopo::{EtopoError, LookupResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the lookup endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationsQuery {
    /// `|`-separated `lat,lon` pairs, e.g. `27.98,86.92|0,0`.
    pub locations: Option<String>,
}

/// Outcome of a lookup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiStatus {
    Ok,
    InvalidRequest,
    ServerError,
}

/// Requested point echoed back with each result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Elevation at one requested point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ElevationResult {
    /// Interpolated elevation in metres.
    pub elevation: i32,
    pub location: Location,
    /// Dataset resolution.
    pub resolution: i32,
}

impl From<LookupResult> for ElevationResult {
    fn from(r: LookupResult) -> Self {
        Self {
            elevation: r.elevation,
            location: Location {
                lat: r.point.lat(),
                lon: r.point.lon(),
            },
            resolution: r.resolution,
        }
    }
}

/// Response body of the lookup endpoint.
///
/// `message` is only present on errors, `results` is empty on errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    pub status: ApiStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub results: Vec<ElevationResult>,
}

impl ApiResponse {
    /// Successful response with results in request order.
    pub fn ok(results: Vec<LookupResult>) -> Self {
        Self {
            status: ApiStatus::Ok,
            message: None,
            results: results.into_iter().map(ElevationResult::from).collect(),
        }
    }

    /// Error response with no results.
    pub fn error(status: ApiStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            results: Vec::new(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Dataset geometry response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetResponse {
    pub rows: usize,
    pub cols: usize,
    /// Cell size in degrees.
    pub cell_size: f64,
    pub resolution: i32,
    pub shard_prefix: String,
    pub shard_count: u32,
    pub shard_capacity: u64,
}

/// Look up elevations for a batch of locations.
///
/// # Returns
///
/// - `200 OK` with one result per location, in request order
/// - `400 Bad Request` if the list is empty or any location is invalid
/// - `500 Internal Server Error` if the dataset cannot be read or the lookup
///   times out
#[utoipa::path(
    get,
    path = "/api/v1/json",
    tag = "elevation",
    params(LocationsQuery),
    responses(
        (status = 200, description = "Elevations found", body = ApiResponse),
        (status = 400, description = "Invalid location list", body = ApiResponse),
        (status = 500, description = "Dataset unavailable or timeout", body = ApiResponse)
    )
)]
pub async fn get_elevations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationsQuery>,
) -> Response {
    let raw = query.locations.unwrap_or_default();
    tracing::debug!(locations = %raw, "Lookup request");

    let lookup_state = Arc::clone(&state);
    let task = tokio::task::spawn_blocking(move || lookup_state.lookup_service.lookup(&raw));

    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(Ok(results))) => {
            tracing::info!(points = results.len(), "Lookup complete");
            (StatusCode::OK, Json(ApiResponse::ok(results))).into_response()
        }
        Ok(Ok(Err(e))) => error_response(e),
        Ok(Err(join_error)) => {
            tracing::error!(error = %join_error, "Lookup task failed");
            server_error()
        }
        Err(_) => {
            tracing::error!(
                timeout_secs = state.request_timeout.as_secs_f64(),
                "Lookup timed out"
            );
            server_error()
        }
    }
}

/// Map a lookup error to its response.
///
/// Invalid input is reported to the client verbatim. Anything else is logged
/// and hidden behind a generic message.
fn error_response(e: EtopoError) -> Response {
    if e.is_invalid_request() {
        tracing::warn!(error = %e, "Invalid lookup request");
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(ApiStatus::InvalidRequest, e.to_string())),
        )
            .into_response();
    }

    tracing::error!(error = %e, details = ?e, "Lookup failed");
    server_error()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error(ApiStatus::ServerError, "Server error.")),
    )
        .into_response()
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Describe the dataset served by this instance.
#[utoipa::path(
    get,
    path = "/dataset",
    tag = "system",
    responses((status = 200, description = "Dataset geometry", body = DatasetResponse))
)]
pub async fn get_dataset(State(state): State<Arc<AppState>>) -> Json<DatasetResponse> {
    let service = &state.lookup_service;
    let config = service.config();

    Json(DatasetResponse {
        rows: config.n_rows,
        cols: config.n_cols,
        cell_size: config.cell_size,
        resolution: config.resolution,
        shard_prefix: service.shard_prefix().to_string(),
        shard_count: service.shard_count(),
        shard_capacity: config.shard_capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use etopo::GeoPoint;

    #[test]
    fn test_locations_query_deserialize() {
        let query: LocationsQuery =
            serde_json::from_str(r#"{"locations": "0,0|10,20"}"#).unwrap();
        assert_eq!(query.locations.as_deref(), Some("0,0|10,20"));

        let query: LocationsQuery = serde_json::from_str("{}").unwrap();
        assert!(query.locations.is_none());
    }

    #[test]
    fn test_ok_response_serialize() {
        let response = ApiResponse::ok(vec![LookupResult {
            point: GeoPoint::new(1.5, -2.0).unwrap(),
            elevation: 1234,
            resolution: 1800,
        }]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "OK",
                "results": [{
                    "elevation": 1234,
                    "location": {"lat": 1.5, "lon": -2.0},
                    "resolution": 1800
                }]
            })
        );
    }

    #[test]
    fn test_error_response_serialize() {
        let response = ApiResponse::error(ApiStatus::InvalidRequest, "No locations provided.");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "INVALID_REQUEST");
        assert_eq!(json["message"], "No locations provided.");
        assert_eq!(json["results"], serde_json::json!([]));

        let json = serde_json::to_value(ApiStatus::ServerError).unwrap();
        assert_eq!(json, "SERVER_ERROR");
    }

    #[test]
    fn test_health_response_serialize() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }
}

//! Integration tests for the HTTP API.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use etopo::{split::split_into_shards, DatasetConfig, LookupServiceBuilder};
use etopo_service::{router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;

const PREFIX: &str = "test.bin";
const RESOLUTION: i32 = 216_000;

/// 4 × 7 raster of 60° cells; cell (r, c) sits at lat 120 - 60r, lon 60c - 210.
fn test_config() -> DatasetConfig {
    DatasetConfig {
        n_rows: 4,
        n_cols: 7,
        cell_size: 60.0,
        shard_capacity: 16,
        resolution: RESOLUTION,
    }
}

fn write_raster(dir: &Path, value: impl Fn(usize, usize) -> i16) {
    let config = test_config();
    let mut data = Vec::new();
    for row in 0..config.n_rows {
        for col in 0..config.n_cols {
            data.extend_from_slice(&value(row, col).to_le_bytes());
        }
    }
    split_into_shards(Cursor::new(data), dir, PREFIX, &config, |_, _| {}).unwrap();
}

fn create_test_server_with(
    temp_dir: &TempDir,
    config: DatasetConfig,
    request_timeout: Duration,
) -> TestServer {
    let lookup_service = LookupServiceBuilder::new(temp_dir.path())
        .shard_prefix(PREFIX)
        .config(config)
        .build()
        .unwrap();
    let state = Arc::new(AppState {
        lookup_service,
        request_timeout,
    });

    TestServer::new(router(state)).unwrap()
}

fn create_test_server(temp_dir: &TempDir) -> TestServer {
    create_test_server_with(temp_dir, test_config(), Duration::from_secs(30))
}

#[tokio::test]
async fn test_lookup_flat_raster() {
    let temp_dir = TempDir::new().unwrap();
    write_raster(temp_dir.path(), |_, _| 100);
    let server = create_test_server(&temp_dir);

    let response = server
        .get("/api/v1/json")
        .add_query_param("locations", "0,0")
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json,
        json!({
            "status": "OK",
            "results": [{
                "elevation": 100,
                "location": {"lat": 0.0, "lon": 0.0},
                "resolution": RESOLUTION
            }]
        })
    );
}

#[tokio::test]
async fn test_lookup_batch_keeps_order() {
    let temp_dir = TempDir::new().unwrap();
    write_raster(temp_dir.path(), |row, col| (row * 100 + col) as i16);
    let server = create_test_server(&temp_dir);

    let response = server
        .get("/api/v1/json")
        .add_query_param("locations", "60,-150|-30,30|-60,150")
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    // Grid points return the stored samples.
    assert_eq!(results[0]["elevation"], 101);
    assert_eq!(results[2]["elevation"], 306);
    assert_eq!(results[2]["location"], json!({"lat": -60.0, "lon": 150.0}));
    // lat -30 sits halfway between rows 2 and 3 of column 4.
    assert_eq!(results[1]["elevation"], 254);
}

#[tokio::test]
async fn test_lookup_empty_request() {
    let temp_dir = TempDir::new().unwrap();
    write_raster(temp_dir.path(), |_, _| 1);
    let server = create_test_server(&temp_dir);

    for request in [
        server.get("/api/v1/json").add_query_param("locations", ""),
        server.get("/api/v1/json"),
    ] {
        let response = request.await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let json: Value = response.json();
        assert_eq!(json["status"], "INVALID_REQUEST");
        assert_eq!(json["message"], "No locations provided.");
        assert_eq!(json["results"], json!([]));
    }
}

#[tokio::test]
async fn test_lookup_invalid_entry_fails_batch() {
    let temp_dir = TempDir::new().unwrap();
    write_raster(temp_dir.path(), |_, _| 1);
    let server = create_test_server(&temp_dir);

    let response = server
        .get("/api/v1/json")
        .add_query_param("locations", "0,0|bad|10,10")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["status"], "INVALID_REQUEST");
    assert!(json["message"].as_str().unwrap().contains("index 1"));
    assert_eq!(json["results"], json!([]));
}

#[tokio::test]
async fn test_lookup_out_of_bounds() {
    let temp_dir = TempDir::new().unwrap();
    write_raster(temp_dir.path(), |_, _| 1);
    let server = create_test_server(&temp_dir);

    let response = server
        .get("/api/v1/json")
        .add_query_param("locations", "91,0")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["message"], "Invalid location in index 0.");
}

#[tokio::test]
async fn test_lookup_missing_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server
        .get("/api/v1/json")
        .add_query_param("locations", "0,0")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(
        json,
        json!({"status": "SERVER_ERROR", "message": "Server error.", "results": []})
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_lookup_stalled_read_times_out() {
    use std::fs::OpenOptions;
    use std::process::Command;
    use std::time::Instant;

    let temp_dir = TempDir::new().unwrap();
    // Whole raster in one shard, which is a FIFO: opening it blocks until a
    // writer shows up.
    let config = DatasetConfig {
        shard_capacity: 56,
        ..test_config()
    };
    let fifo = temp_dir.path().join(format!("{}.00", PREFIX));
    let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());

    let server = create_test_server_with(&temp_dir, config, Duration::from_millis(200));

    let started = Instant::now();
    let response = server
        .get("/api/v1/json")
        .add_query_param("locations", "0,0")
        .await;
    let elapsed = started.elapsed();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(
        json,
        json!({"status": "SERVER_ERROR", "message": "Server error.", "results": []})
    );
    assert!(elapsed >= Duration::from_millis(200), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "returned after {:?}", elapsed);

    // Release the blocked reader so the runtime can shut down.
    drop(OpenOptions::new().write(true).open(&fifo).unwrap());
}

#[tokio::test]
async fn test_security_headers() {
    let temp_dir = TempDir::new().unwrap();
    write_raster(temp_dir.path(), |_, _| 1);
    let server = create_test_server(&temp_dir);

    let ok = server
        .get("/api/v1/json")
        .add_query_param("locations", "0,0")
        .await;
    let bad = server.get("/api/v1/json").await;

    for response in [ok, bad] {
        assert_eq!(response.header("x-frame-options"), "deny");
        assert_eq!(response.header("x-content-type-options"), "nosniff");
        assert_eq!(response.header("referrer-policy"), "same-origin");
        assert_eq!(
            response.header("strict-transport-security"),
            "max-age=31536000; includeSubDomains; preload"
        );
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_dataset_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/dataset").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["rows"], 4);
    assert_eq!(json["cols"], 7);
    assert_eq!(json["resolution"], RESOLUTION);
    assert_eq!(json["shard_prefix"], PREFIX);
    // 56 bytes in 16-byte shards
    assert_eq!(json["shard_count"], 4);
}

#[tokio::test]
async fn test_openapi_document() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert!(json["paths"]["/api/v1/json"].is_object());
}

//! ETOPO Service - HTTP microservice for batched elevation queries.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ETOPO_DATA_DIR` | Directory containing the shard files | Current directory |
//! | `ETOPO_SHARD_PREFIX` | Shard file name prefix | `etopo1_ice_g_i2.bin` |
//! | `ETOPO_PORT` | HTTP server port | 8080 |
//! | `ETOPO_REQUEST_TIMEOUT_SECS` | Upper bound on one lookup | 30 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /api/v1/json?locations=lat,lon|lat,lon` - Batched elevation lookup
//! - `GET /health` - Health check
//! - `GET /dataset` - Dataset geometry
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use etopo::{LookupServiceBuilder, ShardStatus};
use etopo_service::{router, AppState, DEFAULT_REQUEST_TIMEOUT};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etopo_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Service-specific config
    let port: u16 = std::env::var("ETOPO_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let request_timeout = std::env::var("ETOPO_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

    // The library handles ETOPO_DATA_DIR and ETOPO_SHARD_PREFIX
    let lookup_service = match LookupServiceBuilder::from_env() {
        Ok(builder) => builder.build()?,
        Err(_) => {
            tracing::warn!("ETOPO_DATA_DIR not set, using current directory");
            LookupServiceBuilder::new(".").build()?
        }
    };

    tracing::info!(
        data_dir = %lookup_service.data_dir().display(),
        shard_prefix = lookup_service.shard_prefix(),
        shard_count = lookup_service.shard_count(),
        timeout_secs = request_timeout.as_secs(),
        port = port,
        "Starting ETOPO service"
    );

    // Unusable shards are reported but do not prevent startup; lookups that
    // touch them fail with SERVER_ERROR.
    let mut unusable = 0;
    for report in lookup_service.check_shards() {
        match report.status {
            ShardStatus::Present => {}
            ShardStatus::Missing => {
                unusable += 1;
                tracing::warn!(path = %report.path.display(), "Shard file missing");
            }
            ShardStatus::WrongSize { actual } => {
                unusable += 1;
                tracing::warn!(
                    path = %report.path.display(),
                    expected = report.expected_len,
                    actual = actual,
                    "Shard file has unexpected size"
                );
            }
        }
    }
    if unusable > 0 {
        tracing::warn!(
            unusable = unusable,
            total = lookup_service.shard_count(),
            "Dataset incomplete"
        );
    }

    let state = Arc::new(AppState {
        lookup_service,
        request_timeout,
    });
    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

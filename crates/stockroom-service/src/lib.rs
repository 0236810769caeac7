//! Stockroom HTTP service.
//!
//! Exposes the gateway pipeline over HTTP:
//!
//! - `POST /api/v1/stationery` - Schema-validated stationery lookup
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `BACKEND_TIMEOUT_MS` - Backend invocation budget (default: 5000)
//! - `BACKEND_DELAY_MS` - Artificial backend delay, for chaos testing (default: off)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

#![deny(warnings)]

pub mod config;
mod health;
pub mod logging;
mod routes;

use std::net::SocketAddr;

use tracing::info;

pub use config::ServiceConfig;
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use routes::{build_router, build_state, AppState};

/// Entry point used by the service binary.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("stockroom");
    init_logging(&logging_config);

    let config = ServiceConfig::from_env();
    info!(
        port = config.port,
        backend_timeout_ms = config.backend_timeout.as_millis() as u64,
        "starting stockroom service"
    );

    // Schema registration happens here; a misconfigured schema id fails the
    // process before it starts accepting traffic.
    let state = build_state(&config)?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

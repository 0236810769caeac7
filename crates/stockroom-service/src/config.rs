//! Service configuration from environment variables.

use std::time::Duration;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default backend invocation budget in milliseconds.
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 5000;

/// Runtime configuration for the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// HTTP port to bind.
    pub port: u16,

    /// Wall-clock budget for each backend invocation.
    pub backend_timeout: Duration,

    /// Artificial per-invocation backend delay; off unless set. Used to
    /// exercise the timeout path without a misbehaving backend.
    pub backend_delay: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
            backend_delay: None,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the environment.
    ///
    /// - `SERVICE_PORT` (default 8080)
    /// - `BACKEND_TIMEOUT_MS` (default 5000)
    /// - `BACKEND_DELAY_MS` (default unset)
    pub fn from_env() -> Self {
        let port = std::env::var("SERVICE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let backend_timeout = std::env::var("BACKEND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS));

        let backend_delay = std::env::var("BACKEND_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis);

        Self {
            port,
            backend_timeout,
            backend_delay,
        }
    }

    /// Override the backend invocation budget.
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Enable the artificial backend delay.
    pub fn with_backend_delay(mut self, delay: Duration) -> Self {
        self.backend_delay = Some(delay);
        self
    }
}

//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::worker::WorkerConfig;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Number of worker loops polling the repository.
    pub worker_count: usize,
    /// Wait between successive claim attempts of a single worker.
    pub poll_interval: Duration,
    /// Latency of the built-in `slow` handler.
    pub slow_handler_delay: Duration,
    /// Emit log lines as JSON.
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            worker_count: 10,
            poll_interval: Duration::from_millis(50),
            slow_handler_delay: Duration::from_secs(10),
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Build config from `TASK_POOL_*` environment variables.
    ///
    /// Unset variables fall back to the defaults; set but unparsable values
    /// are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = std::env::var("TASK_POOL_HOST").unwrap_or(defaults.host);
        let port = env_parse::<u16>("TASK_POOL_PORT")?.unwrap_or(defaults.port);

        let worker_count = env_parse::<usize>("TASK_POOL_WORKERS")?.unwrap_or(defaults.worker_count);

        let poll_interval = env_parse::<u64>("TASK_POOL_POLL_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let slow_handler_delay = env_parse::<u64>("TASK_POOL_SLOW_HANDLER_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.slow_handler_delay);

        let log_json = std::env::var("TASK_POOL_LOG_JSON")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(defaults.log_json);

        let config = Self {
            host,
            port,
            worker_count,
            poll_interval,
            slow_handler_delay,
            log_json,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TASK_POOL_WORKERS".to_string(),
                message: "at least one worker is required".to_string(),
            });
        }
        Ok(())
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Worker pool settings derived from this config.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            worker_count: self.worker_count,
            poll_interval: self.poll_interval,
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

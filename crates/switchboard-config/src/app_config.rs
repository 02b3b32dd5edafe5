//! Application configuration structures.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_core::telemetry::LogFormat;
use url::Url;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name and metadata.
    pub app: AppMetadata,

    /// Operator endpoint server.
    pub server: ServerConfig,

    /// Backing store connection.
    pub store: StoreConfig,

    /// Cache component defaults.
    pub cache: CacheConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "switchboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Operator endpoint server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Backing store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Use the Redis store. When false an in-process store is used instead
    /// (local development only; state is not shared between replicas).
    pub enabled: bool,
    /// Full connection URL. Takes precedence over host/port/credentials.
    pub url: Option<String>,
    /// Store host.
    pub host: String,
    /// Store port.
    pub port: u16,
    /// ACL username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Logical database index.
    pub database: u32,
    /// Use TLS (`rediss://`).
    pub tls: bool,
    /// Maximum pooled connections.
    pub pool_size: usize,
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-command timeout in milliseconds.
    pub command_timeout_ms: u64,
    /// Reconnection backoff.
    pub reconnect: ReconnectConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            tls: false,
            pool_size: 16,
            connect_timeout_ms: 5_000,
            command_timeout_ms: 2_000,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the connection URL, built from host/port/credentials unless
    /// `url` is set explicitly.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let scheme = if self.tls { "rediss" } else { "redis" };
        let mut url = Url::parse(&format!(
            "{scheme}://{}:{}/{}",
            self.host, self.port, self.database
        ))
        .map_err(|e| ConfigError::Value(format!("store address: {e}")))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|()| ConfigError::Value("store username".to_string()))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|()| ConfigError::Value("store password".to_string()))?;
        }

        Ok(url.to_string())
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the command timeout as a Duration.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Exponential backoff used while (re)acquiring a store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// First retry delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound of a single delay in milliseconds.
    pub max_delay_ms: u64,
    /// Delay multiplier per attempt.
    pub multiplier: f64,
    /// Randomization factor in `[0, 1]`; 0 disables jitter.
    pub jitter: f64,
    /// Give up after this much total time, in milliseconds.
    pub max_elapsed_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 50,
            max_delay_ms: 2_000,
            multiplier: 2.0,
            jitter: 0.3,
            max_elapsed_ms: 5_000,
        }
    }
}

impl ReconnectConfig {
    /// Returns the initial delay as a Duration.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Returns the delay cap as a Duration.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Returns the total retry budget as a Duration.
    #[must_use]
    pub const fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }
}

/// Defaults for the cache components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix prepended (with `:`) to every key. Empty means no prefix.
    pub key_prefix: String,
    /// Default TTL of generic cache entries, in seconds.
    pub default_ttl_secs: u64,
    /// Default session TTL, in seconds.
    pub session_ttl_secs: u64,
    /// Default conversation state TTL, in seconds.
    pub conversation_ttl_secs: u64,
    /// Default rate limit policy.
    pub rate_limit: RateLimitConfig,
    /// Names of the specialised job queues.
    pub queues: QueueNames,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            default_ttl_secs: 3_600,
            session_ttl_secs: 86_400,
            conversation_ttl_secs: 7_200,
            rate_limit: RateLimitConfig::default(),
            queues: QueueNames::default(),
        }
    }
}

/// Default fixed-window rate limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u64,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 3_600,
        }
    }
}

/// Queue names of the two specialised job queues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueNames {
    /// Outbound message queue.
    pub messages: String,
    /// Automation trigger queue.
    pub automations: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        Self {
            messages: "message_queue".to_string(),
            automations: "automation_queue".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Log format (pretty, json).
    pub log_format: LogFormat,
    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

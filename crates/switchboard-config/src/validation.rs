//! Configuration validation.
//!
//! Collects every problem in one pass so operators can fix a broken
//! deployment in a single iteration rather than one error at a time.

use crate::{AppConfig, ConfigError};
use std::fmt;

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// The store pool must hold at least one connection.
    ZeroPoolSize,
    /// A timeout must be positive.
    NonPositiveTimeout { name: String },
    /// A TTL must be at least one second.
    ZeroTtl { name: String },
    /// The rate limit must allow at least one request per window.
    ZeroRateLimit,
    /// Backoff delays are inverted.
    InvalidBackoff { initial_ms: u64, max_ms: u64 },
    /// Backoff multiplier must be at least 1.
    InvalidMultiplier { value: f64 },
    /// Jitter must lie in `[0, 1]`.
    InvalidJitter { value: f64 },
    /// Queue names must be non-empty.
    EmptyQueueName { name: String },
    /// The two specialised queues must not share a sorted set.
    DuplicateQueueName { value: String },
    /// The store URL could not be built.
    InvalidStoreUrl { message: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPoolSize => write!(f, "store pool size must be at least 1"),
            Self::NonPositiveTimeout { name } => write!(f, "{name} must be positive"),
            Self::ZeroTtl { name } => write!(f, "{name} must be at least 1 second"),
            Self::ZeroRateLimit => write!(f, "rate limit max_requests must be at least 1"),
            Self::InvalidBackoff { initial_ms, max_ms } => write!(
                f,
                "reconnect initial delay ({initial_ms}ms) exceeds max delay ({max_ms}ms)"
            ),
            Self::InvalidMultiplier { value } => {
                write!(f, "reconnect multiplier must be >= 1.0, got {value}")
            }
            Self::InvalidJitter { value } => {
                write!(f, "reconnect jitter must be within [0, 1], got {value}")
            }
            Self::EmptyQueueName { name } => write!(f, "queue name '{name}' is empty"),
            Self::DuplicateQueueName { value } => {
                write!(f, "message and automation queues share the name '{value}'")
            }
            Self::InvalidStoreUrl { message } => write!(f, "invalid store URL: {message}"),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl AppConfig {
    /// Returns every validation problem found in this configuration.
    #[must_use]
    pub fn validation_errors(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let store = &self.store;
        let cache = &self.cache;

        if store.pool_size == 0 {
            errors.push(ConfigValidationError::ZeroPoolSize);
        }
        for (name, value) in [
            ("store.connect_timeout_ms", store.connect_timeout_ms),
            ("store.command_timeout_ms", store.command_timeout_ms),
            ("store.reconnect.max_elapsed_ms", store.reconnect.max_elapsed_ms),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::NonPositiveTimeout {
                    name: name.to_string(),
                });
            }
        }

        let reconnect = &store.reconnect;
        if reconnect.initial_delay_ms > reconnect.max_delay_ms {
            errors.push(ConfigValidationError::InvalidBackoff {
                initial_ms: reconnect.initial_delay_ms,
                max_ms: reconnect.max_delay_ms,
            });
        }
        if reconnect.multiplier.is_nan() || reconnect.multiplier < 1.0 {
            errors.push(ConfigValidationError::InvalidMultiplier {
                value: reconnect.multiplier,
            });
        }
        if !(0.0..=1.0).contains(&reconnect.jitter) {
            errors.push(ConfigValidationError::InvalidJitter {
                value: reconnect.jitter,
            });
        }

        if store.enabled {
            if let Err(e) = store.connection_url() {
                errors.push(ConfigValidationError::InvalidStoreUrl {
                    message: e.to_string(),
                });
            }
        }

        for (name, value) in [
            ("cache.default_ttl_secs", cache.default_ttl_secs),
            ("cache.session_ttl_secs", cache.session_ttl_secs),
            ("cache.conversation_ttl_secs", cache.conversation_ttl_secs),
            ("cache.rate_limit.window_secs", cache.rate_limit.window_secs),
        ] {
            if value == 0 {
                errors.push(ConfigValidationError::ZeroTtl {
                    name: name.to_string(),
                });
            }
        }
        if cache.rate_limit.max_requests == 0 {
            errors.push(ConfigValidationError::ZeroRateLimit);
        }

        let queues = &cache.queues;
        for (name, value) in [
            ("messages", &queues.messages),
            ("automations", &queues.automations),
        ] {
            if value.trim().is_empty() {
                errors.push(ConfigValidationError::EmptyQueueName {
                    name: name.to_string(),
                });
            }
        }
        if !queues.messages.is_empty() && queues.messages == queues.automations {
            errors.push(ConfigValidationError::DuplicateQueueName {
                value: queues.messages.clone(),
            });
        }

        errors
    }

    /// Validates the configuration, failing with every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigError};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable selecting the environment-specific config file.
pub const ENVIRONMENT_VAR: &str = "SWITCHBOARD_ENVIRONMENT";

/// Prefix of structured environment overrides (`SWITCHBOARD__STORE__HOST`).
pub const ENV_PREFIX: &str = "SWITCHBOARD";

/// Conventional store connection variables shared with the rest of the platform.
#[derive(Debug, Clone, Default)]
pub struct RedisEnv {
    /// `REDIS_URL`
    pub url: Option<String>,
    /// `REDIS_HOST`
    pub host: Option<String>,
    /// `REDIS_PORT`
    pub port: Option<String>,
    /// `REDIS_USERNAME`
    pub username: Option<String>,
    /// `REDIS_PASSWORD`
    pub password: Option<String>,
    /// `REDIS_DB`
    pub database: Option<String>,
}

impl RedisEnv {
    /// Reads the variables from the process environment.
    #[must_use]
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            url: var("REDIS_URL"),
            host: var("REDIS_HOST"),
            port: var("REDIS_PORT"),
            username: var("REDIS_USERNAME"),
            password: var("REDIS_PASSWORD"),
            database: var("REDIS_DB"),
        }
    }

    fn apply(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let port = parse_int("REDIS_PORT", self.port.as_deref())?;
        let database = parse_int("REDIS_DB", self.database.as_deref())?;

        Ok(builder
            .set_override_option("store.url", self.url.clone())?
            .set_override_option("store.host", self.host.clone())?
            .set_override_option("store.port", port)?
            .set_override_option("store.username", self.username.clone())?
            .set_override_option("store.password", self.password.clone())?
            .set_override_option("store.database", database)?)
    }
}

fn parse_int(name: &str, value: Option<&str>) -> Result<Option<i64>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .map_err(|e| ConfigError::Value(format!("{name}={v}: {e}")))
        })
        .transpose()
}

/// Loads and validates configuration from `config_dir`.
///
/// Sources, later ones overriding earlier ones:
/// 1. `{config_dir}/default.toml`
/// 2. `{config_dir}/{environment}.toml`
/// 3. `{config_dir}/local.toml` (not committed to version control)
/// 4. Environment variables with the `SWITCHBOARD__` prefix
/// 5. `REDIS_*` connection variables
pub fn load_config(
    config_dir: &str,
    environment: &str,
    redis_env: &RedisEnv,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    for name in ["default", environment, "local"] {
        let path = format!("{config_dir}/{name}.toml");
        if Path::new(&path).exists() {
            debug!("Loading config from: {}", path);
            builder = builder.add_source(File::with_name(&path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );
    builder = redis_env.apply(builder)?;

    let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
    app_config.app.environment = environment.to_string();

    app_config.validate()?;

    if app_config.app.environment == "production" && !app_config.store.enabled {
        warn!("In-process store enabled in production; state will not be shared between replicas");
    }

    Ok(app_config)
}

/// Directory searched for configuration files by the server binary.
pub const DEFAULT_CONFIG_DIR: &str = "./config";

/// Loads configuration for the running process.
///
/// Reads `.env` if present, takes the environment name from
/// `SWITCHBOARD_ENVIRONMENT` (default `development`), and applies the
/// `REDIS_*` variables on top of `config_dir`.
pub fn load_from_env(config_dir: &str) -> Result<AppConfig, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file found or error loading it: {}", e);
    }

    let environment =
        std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());
    info!("Loading configuration for environment: {}", environment);

    load_config(config_dir, &environment, &RedisEnv::from_process())
}

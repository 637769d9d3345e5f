//! Configuration loader with layered sources.

use crate::AppConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, Map};
use std::path::PathBuf;
use tracing::{debug, info};
use userhub_core::{HubError, HubResult};

/// Unprefixed variables used by existing deployments, mapped onto their
/// configuration keys. They take precedence over every other source.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("REDIS_HOST", "redis.host"),
    ("REDIS_PORT", "redis.port"),
    ("PORT", "server.port"),
];

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Untracked local overrides
    /// 4. Environment variables with `USERHUB__` prefix
    /// 5. `DATABASE_URL`, `REDIS_HOST`, `REDIS_PORT`, `PORT`
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Loader for the default location (`./config`).
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Loads and validates the configuration from the process environment.
    pub fn load(&self) -> HubResult<AppConfig> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("USERHUB_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        self.load_with(&environment, &std::env::vars().collect())
    }

    /// Loads the configuration for `environment`, reading the `USERHUB__`
    /// and legacy variables from `vars` instead of the process environment.
    pub fn load_with(&self, environment: &str, vars: &Map<String, String>) -> HubResult<AppConfig> {
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        builder = self.add_file(builder, "default");
        builder = self.add_file(builder, environment);
        builder = self.add_file(builder, "local");

        builder = builder.add_source(
            Environment::with_prefix("USERHUB")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        for (var, key) in LEGACY_ENV_KEYS {
            let value = vars.get(*var).filter(|v| !v.trim().is_empty()).cloned();
            if value.is_some() {
                debug!("Applying {} from environment", var);
            }
            builder = builder
                .set_override_option(*key, value)
                .map_err(config_error_to_hub_error)?;
        }

        let app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize::<AppConfig>)
            .map_err(config_error_to_hub_error)?;

        validate_config(&app_config)?;

        Ok(app_config)
    }

    fn add_file(
        &self,
        builder: ConfigBuilder<DefaultState>,
        name: &str,
    ) -> ConfigBuilder<DefaultState> {
        let path = self.config_dir.join(format!("{name}.toml"));
        if path.exists() {
            debug!("Loading config from: {}", path.display());
            builder.add_source(File::from(path).required(false))
        } else {
            builder
        }
    }
}

/// Validates the configuration.
pub fn validate_config(config: &AppConfig) -> HubResult<()> {
    if config.database.url.trim().is_empty() {
        return Err(HubError::Configuration("Database URL is required".to_string()));
    }

    if config.redis.enabled && config.redis.host.trim().is_empty() {
        return Err(HubError::Configuration(
            "Redis host is required when Redis is enabled".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(HubError::Configuration(
            "Cache TTL must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn config_error_to_hub_error(err: ConfigError) -> HubError {
    HubError::Configuration(err.to_string())
}

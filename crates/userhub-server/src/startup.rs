//! Server startup utilities.

use tracing::info;
use userhub_config::AppConfig;
use userhub_rest::{OPENAPI_JSON_PATH, SWAGGER_UI_PATH};

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r"
  _   _                 _           _
 | | | |___  ___ _ __  | |__  _   _| |__
 | | | / __|/ _ \ '__| | '_ \| | | | '_ \
 | |_| \__ \  __/ |    | | | | |_| | |_) |
  \___/|___/\___|_|    |_| |_|\__,_|_.__/
    "
    );
}

/// Prints where the server can be reached.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let base = format!("http://{}", config.server.addr());
    info!("{}", separator);
    info!("Service:     {}", config.app.name);
    info!("Environment: {}", config.app.environment);
    info!("REST API:    {}/users", base);
    info!("Health:      {}/health", base);
    info!("Readiness:   {}/ready", base);
    info!("API Docs:    {}{}", base, SWAGGER_UI_PATH);
    info!("OpenAPI:     {}{}", base, OPENAPI_JSON_PATH);
    if config.redis.enabled {
        info!("Cache:       redis://{}:{}", config.redis.host, config.redis.port);
    } else {
        info!("Cache:       in-process");
    }
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut config = AppConfig::default();
        print_startup_info(&config);

        config.redis.enabled = false;
        print_startup_info(&config);
    }
}

// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{ColorFallback, Config, HealthConfig, SourceConfig, SourceKind};

/// Public CDN mirror of the selfh.st icon repository
pub const DEFAULT_CDN_ROOT: &str = "https://cdn.jsdelivr.net/gh/selfhst/icons";

/// Environment variables look like `ICONS_SERVER__PORT=8080`
const ENV_PREFIX: &str = "ICONS";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// e.g. `config` picks up `config.toml`; a missing file just means defaults
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, None)
    }

    /// `env` stands in for the process environment when given
    fn load_with_env(
        config_path: &str,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4050)?
            .set_default("source.kind", "cdn")?
            .set_default("source.cdn_root", DEFAULT_CDN_ROOT)?
            .set_default("source.local_root", ".")?
            .set_default("source.fetch_timeout", 10)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

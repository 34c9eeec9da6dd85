//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: SHOUTOUTS_, nested keys split on `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/shoutouts/{service_name}/config.toml
//! 4. System directory: /etc/shoutouts/{service_name}/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// URL scheme that selects the in-memory store instead of MongoDB
pub const MEMORY_URL_SCHEME: &str = "mem://";

const ENV_PREFIX: &str = "SHOUTOUTS_";
const CONFIG_DIR_PREFIX: &str = "shoutouts";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// MongoDB configuration
    pub mongodb: MongoConfig,

    /// Caching directives for the top-five endpoint
    #[serde(default)]
    pub top_five: TopFiveConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string, or `mem://` for the in-memory store
    pub url: String,

    /// Database name. Falls back to the connection string's default database.
    #[serde(default)]
    pub database: Option<String>,

    /// Collection holding the shoutout documents
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Application name reported to the server
    #[serde(default)]
    pub app_name: Option<String>,

    /// Connect and server selection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum retry attempts for the startup connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Connect on first use instead of at startup
    #[serde(default = "default_lazy_init")]
    pub lazy_init: bool,
}

impl MongoConfig {
    /// Whether the URL selects the in-memory store
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with(MEMORY_URL_SCHEME)
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: default_mongodb_url(),
            database: None,
            collection: default_collection(),
            app_name: None,
            connect_timeout_secs: default_connection_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            lazy_init: default_lazy_init(),
        }
    }
}

/// Cache lifetimes advertised by `GET /top-five`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFiveConfig {
    /// Browser cache lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u32,

    /// Shared cache (CDN) lifetime in seconds
    #[serde(default = "default_s_maxage")]
    pub s_maxage_secs: u32,
}

impl TopFiveConfig {
    /// Render the `Cache-Control` header value
    pub fn cache_control(&self) -> String {
        format!(
            "public, max-age={}, s-maxage={}",
            self.max_age_secs, self.s_maxage_secs
        )
    }
}

impl Default for TopFiveConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age(),
            s_maxage_secs: default_s_maxage(),
        }
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// Enable panic recovery middleware
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Enable compression
    #[serde(default = "default_true")]
    pub compression: bool,

    /// CORS mode: permissive, restrictive or disabled
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            catch_panic: true,
            compression: true,
            cors_mode: default_cors_mode(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_mongodb_url() -> String {
    "mongodb://localhost:27017/shoutouts".to_string()
}

fn default_collection() -> String {
    "shoutouts".to_string()
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_lazy_init() -> bool {
    true
}

fn default_max_age() -> u32 {
    60
}

fn default_s_maxage() -> u32 {
    120
}

fn default_true() -> bool {
    true
}

fn default_body_limit_mb() -> usize {
    10 // 10 MB
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the binary name.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "shoutouts".to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later merges override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses XDG and system directories. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Find all possible config file paths for a service, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Some(path) = xdg_dirs.find_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(CONFIG_DIR_PREFIX)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "shoutouts".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                log_format: default_log_format(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            mongodb: MongoConfig::default(),
            top_five: TopFiveConfig::default(),
            middleware: MiddlewareConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.mongodb.collection, "shoutouts");
        assert!(config.mongodb.lazy_init);
        assert!(!config.mongodb.is_in_memory());
    }

    #[test]
    fn test_default_cache_control() {
        assert_eq!(
            TopFiveConfig::default().cache_control(),
            "public, max-age=60, s-maxage=120"
        );
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "shoutouts-test"
port = 9099

[mongodb]
url = "mem://"
collection = "kudos"

[top_five]
max_age_secs = 5
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "shoutouts-test");
        assert_eq!(config.service.port, 9099);
        assert_eq!(config.service.timeout_secs, 30);
        assert!(config.mongodb.is_in_memory());
        assert_eq!(config.mongodb.collection, "kudos");
        assert_eq!(config.mongodb.max_retries, 5);
        assert_eq!(
            config.top_five.cache_control(),
            "public, max-age=5, s-maxage=120"
        );
    }
}

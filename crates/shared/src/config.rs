//! Application configuration management.

use serde::Deserialize;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "GHOST_QINIU";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2368
}

/// Qiniu storage settings as they appear in config files and the environment.
///
/// Keys are accepted in snake_case and in the blog's camelCase spelling.
#[derive(Clone, Deserialize)]
pub struct StorageSettings {
    /// Qiniu access key.
    #[serde(alias = "accessKey")]
    pub access_key: String,
    /// Qiniu secret key.
    #[serde(alias = "secretKey")]
    pub secret_key: String,
    /// Bucket (upload scope).
    pub bucket: String,
    /// Public base URL the bucket is served from.
    pub domain: String,
    /// Path template for stored files.
    #[serde(default)]
    pub format: Option<String>,
    /// Form upload endpoint.
    #[serde(default, alias = "uploadUrl")]
    pub upload_url: Option<String>,
    /// Upload token lifetime in seconds.
    #[serde(default, alias = "tokenTtlSecs")]
    pub token_ttl_secs: Option<u64>,
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[hidden]")
            .field("bucket", &self.bucket)
            .field("domain", &self.domain)
            .field("format", &self.format)
            .field("upload_url", &self.upload_url)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

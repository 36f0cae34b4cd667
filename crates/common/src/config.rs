//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::AppError;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token and secret configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Catalog bootstrap configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
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

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign access tokens (HS256).
    #[serde(default)]
    pub jwt_secret: String,
    /// Application secret.
    #[serde(default)]
    pub secret_key: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            secret_key: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// S3 object storage configuration.
///
/// Credentials and region fall back to the AWS default provider chain
/// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`, ...) when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding plant and comment images.
    #[serde(default)]
    pub bucket: Option<String>,
    /// AWS region.
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint (e.g. `MinIO`); uses path-style addressing when set.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Lifetime of signed image URLs in seconds.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            url_expiry_secs: default_url_expiry_secs(),
        }
    }
}

/// Catalog bootstrap configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// JSON file used to seed an empty catalog at startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

const fn default_token_ttl_secs() -> u64 {
    15 * 60
}

const fn default_url_expiry_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` in the working directory (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `VERDANT_ENV`)
    /// 4. Environment variables with `VERDANT_` prefix (`__` separates sections)
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();

        let env = std::env::var("VERDANT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VERDANT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("VERDANT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check that the secrets required to start are present.
    ///
    /// The database URL, token secret and application secret must be
    /// non-empty; the server refuses to start otherwise.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("VERDANT_DATABASE__URL", &self.database.url),
            ("VERDANT_AUTH__JWT_SECRET", &self.auth.jwt_secret),
            ("VERDANT_AUTH__SECRET_KEY", &self.auth.secret_key),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "{name} is not set. Please check your environment variables."
                )));
            }
        }

        Ok(())
    }
}

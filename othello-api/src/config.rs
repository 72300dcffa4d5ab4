/// Configuration management for the API server
///
/// Configuration comes from environment variables, with a `.env` file
/// honored in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 50052)
/// - `REQUEST_TIMEOUT_SECONDS`: Deadline applied to every call, and the cap
///   on caller-supplied deadlines (default: 30)
/// - `RUST_LOG`: Log filter (see `main.rs` for the default)
/// - `LOG_FORMAT`: `json` for JSON log lines, anything else for text
///
/// # Example
///
/// ```no_run
/// use othello_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Account service configuration
    pub service: ServiceConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Account service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Default per-request deadline in seconds
    pub request_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a numeric variable
    /// does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "50052".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let request_timeout_seconds = lookup("REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS is invalid: {}", e))?;

        if request_timeout_seconds == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECONDS must be greater than zero");
        }

        Ok(Self {
            api: ApiConfig { host, port },
            database: DatabaseConfig {
                url,
                max_connections,
            },
            service: ServiceConfig {
                request_timeout_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Default deadline for account operations
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_seconds)
    }

    /// Pool settings for the shared database layer
    pub fn pool_config(&self) -> othello_shared::db::pool::DatabaseConfig {
        othello_shared::db::pool::DatabaseConfig {
            max_connections: self.database.max_connections,
            ..othello_shared::db::pool::DatabaseConfig::new(self.database.url.clone())
        }
    }
}

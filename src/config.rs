//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use crate::connection::ConnectionParams;
use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Diagram rendering service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiagramConfig {
    /// Endpoint accepting `{"diagram_source": ...}` and answering with a PNG
    pub render_url: String,
    pub timeout_secs: u64,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            render_url: "https://kroki.io/mermaid/png".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub diagram: DiagramConfig,
    /// Connection opened at startup when DATABASE_URL is set
    pub startup_connection: Option<ConnectionParams>,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let diagram = DiagramConfig {
            render_url: std::env::var("DIAGRAM_RENDER_URL")
                .unwrap_or_else(|_| DiagramConfig::default().render_url),
            timeout_secs: std::env::var("DIAGRAM_RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| DiagramConfig::default().timeout_secs),
        };

        let startup_connection = match std::env::var("DATABASE_URL") {
            Ok(database_url) => Some(Self::parse_database_url(&database_url)?),
            Err(_) => None,
        };

        Ok(Self {
            server,
            cors,
            diagram,
            startup_connection,
        })
    }

    /// Parse a DATABASE_URL connection string (postgresql://...)
    pub fn parse_database_url(url: &str) -> Result<ConnectionParams, ConfigError> {
        let parsed = url::Url::parse(url).map_err(|_| {
            ConfigError::InvalidValue(
                "Invalid DATABASE_URL format (expected postgresql://...)".to_string(),
            )
        })?;

        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidValue(format!(
                "Unsupported DATABASE_URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidValue("Missing host in DATABASE_URL".to_string()))?;

        let server = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let database = parsed.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(ConfigError::InvalidValue(
                "Missing database name in DATABASE_URL".to_string(),
            ));
        }

        let username = Some(parsed.username().to_string()).filter(|u| !u.is_empty());
        let password = parsed.password().map(|p| p.to_string());
        let require_tls = parsed
            .query_pairs()
            .any(|(k, v)| k == "sslmode" && v == "require");

        Ok(ConnectionParams {
            server,
            database,
            username,
            password,
            require_tls,
        })
    }
}

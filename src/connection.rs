//! Database connection
//!
//! Opens the single long-lived connection an explorer session works with and
//! checks it before every use.

use crate::catalog::queries::PING;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Client, Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use serde::Serialize;
use tokio_postgres::NoTls;
use tracing::{debug, info, warn};

const DEFAULT_PORT: u16 = 5432;

/// Parameters of a database connection.
///
/// Without a username the connection uses trusted authentication: the
/// operating-system user name and no password.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// `host` or `host:port`
    pub server: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub require_tls: bool,
}

impl ConnectionParams {
    /// Split `server` into host and port
    pub fn host_and_port(&self) -> Result<(String, u16), AppError> {
        let server = self.server.trim();
        if server.is_empty() {
            return Err(AppError::Validation("Server is required".to_string()));
        }

        match server.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.ends_with(':') => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AppError::Validation(format!("Invalid port in server '{}'", server)))?;
                Ok((host.trim_matches(|c| c == '[' || c == ']').to_string(), port))
            }
            _ => Ok((server.to_string(), DEFAULT_PORT)),
        }
    }

    /// Whether trusted (integrated) authentication is used
    pub fn is_trusted(&self) -> bool {
        self.username.as_deref().map_or(true, str::is_empty)
    }

    /// User the connection authenticates as
    pub fn effective_user(&self) -> String {
        match &self.username {
            Some(user) if !user.is_empty() => user.clone(),
            _ => std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "postgres".to_string()),
        }
    }

    fn pool_config(&self) -> Result<Config, AppError> {
        let (host, port) = self.host_and_port()?;

        let mut cfg = Config::new();
        cfg.host = Some(host);
        cfg.port = Some(port);
        cfg.user = Some(self.effective_user());
        cfg.password = if self.is_trusted() {
            None
        } else {
            self.password.clone()
        };
        cfg.dbname = Some(self.database.clone());
        cfg.application_name = Some(env!("CARGO_PKG_NAME").to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Verified,
        });
        // One connection per session: queries never run concurrently
        cfg.pool = Some(PoolConfig::new(1));
        Ok(cfg)
    }
}

/// Public connection info (safe to expose to clients)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub server: String,
    pub database: String,
    pub user: String,
    pub trusted_auth: bool,
    pub tls: bool,
    pub connected_at: DateTime<Utc>,
}

/// An open connection owned by the explorer session.
///
/// The single pooled client stays checked out for the lifetime of the
/// session, so a lost connection is never silently replaced. Dropping it
/// closes the underlying connection.
pub struct ActiveConnection {
    params: ConnectionParams,
    pool: Pool,
    client: Client,
    connected_at: DateTime<Utc>,
}

impl ActiveConnection {
    /// Connect and verify the connection with a liveness query
    pub async fn open(params: ConnectionParams) -> Result<Self, AppError> {
        let cfg = params.pool_config()?;

        let pool = if params.require_tls {
            let certs = rustls_native_certs::load_native_certs();
            let mut root_store = rustls::RootCertStore::empty();
            for cert in certs.certs {
                root_store.add(cert).ok();
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
            cfg.create_pool(Some(Runtime::Tokio1), tls)
        } else {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        }
        .map_err(|e| AppError::Connection(format!("Failed to create pool: {}", e)))?;

        let client = pool
            .get()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;
        client
            .query_one(PING, &[])
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        info!(
            "Connected to database '{}' on {} (TLS: {})",
            params.database, params.server, params.require_tls
        );

        Ok(Self {
            params,
            pool,
            client,
            connected_at: Utc::now(),
        })
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            server: self.params.server.clone(),
            database: self.params.database.clone(),
            user: self.params.effective_user(),
            trusted_auth: self.params.is_trusted(),
            tls: self.params.require_tls,
            connected_at: self.connected_at,
        }
    }

    /// The session client, failing if the connection has been lost.
    ///
    /// A lost connection is never re-established here; the client has to
    /// reconnect explicitly.
    pub fn client(&self) -> Result<&Client, AppError> {
        if self.client.is_closed() {
            warn!("Connection to '{}' was lost", self.params.database);
            return Err(AppError::NotConnected(format!(
                "Connection to '{}' was lost. Reconnect to continue.",
                self.params.database
            )));
        }

        debug!("Using connection to '{}'", self.params.database);
        Ok(&self.client)
    }

    /// Close the connection
    pub fn close(self) {
        self.pool.close();
        info!("Disconnected from database '{}'", self.params.database);
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            self.pool.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(server: &str) -> ConnectionParams {
        ConnectionParams {
            server: server.to_string(),
            database: "sales".to_string(),
            username: None,
            password: None,
            require_tls: false,
        }
    }

    #[test]
    fn test_server_with_port() {
        assert_eq!(params("db.local:5433").host_and_port().unwrap(), ("db.local".to_string(), 5433));
    }

    #[test]
    fn test_server_default_port() {
        assert_eq!(params("localhost").host_and_port().unwrap(), ("localhost".to_string(), 5432));
    }

    #[test]
    fn test_bracketed_ipv6_server() {
        assert_eq!(params("[::1]:6543").host_and_port().unwrap(), ("::1".to_string(), 6543));
    }

    #[test]
    fn test_invalid_server() {
        assert!(params("").host_and_port().is_err());
        assert!(params("db.local:port").host_and_port().is_err());
    }

    #[test]
    fn test_missing_username_means_trusted_auth() {
        let mut p = params("localhost");
        assert!(p.is_trusted());

        p.username = Some("explorer".to_string());
        p.password = Some("secret".to_string());
        assert!(!p.is_trusted());
        assert_eq!(p.effective_user(), "explorer");

        let cfg = p.pool_config().unwrap();
        assert_eq!(cfg.user.as_deref(), Some("explorer"));
        assert_eq!(cfg.password.as_deref(), Some("secret"));
        assert_eq!(cfg.pool.map(|pc| pc.max_size), Some(1));
    }

    #[test]
    fn test_trusted_auth_sends_no_password() {
        let mut p = params("localhost");
        p.password = Some("ignored".to_string());

        let cfg = p.pool_config().unwrap();
        assert!(cfg.password.is_none());
    }
}

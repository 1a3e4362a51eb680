//! Explorer session
//!
//! Owns the database connection and everything derived from it: the cached
//! table list, the remembered search text and the last analysis. All state
//! is cleared together when the connection goes away.

use crate::analysis::{self, filter_tables, Analysis};
use crate::catalog::{Catalog, PostgresCatalog};
use crate::connection::{ActiveConnection, ConnectionInfo, ConnectionParams};
use crate::error::{not_found_error, AppError};
use crate::report::{build_report, Report};
use serde::Serialize;
use tracing::{info, warn};

/// Snapshot of the session for status responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
    pub table_count: usize,
    pub search: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzed_table: Option<String>,
    pub can_reconnect: bool,
}

#[derive(Default)]
pub struct ExplorerSession {
    connection: Option<ActiveConnection>,
    last_params: Option<ConnectionParams>,
    tables: Vec<String>,
    search: String,
    analysis: Option<Analysis>,
}

impl ExplorerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection and cache the table list.
    ///
    /// Any previous connection is released first. On failure the session is
    /// left disconnected with nothing cached.
    pub async fn connect(&mut self, params: ConnectionParams) -> Result<SessionStatus, AppError> {
        self.disconnect();
        self.last_params = Some(params.clone());

        let connection = ActiveConnection::open(params).await?;
        let tables = PostgresCatalog::new(connection.client()?)
            .list_tables()
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        info!(
            "Session connected to '{}': {} table(s)",
            connection.params().database,
            tables.len()
        );

        self.connection = Some(connection);
        self.tables = tables;
        Ok(self.status())
    }

    /// Release the connection and clear all derived state.
    ///
    /// Returns whether a connection was open. The last connection parameters
    /// are kept for [`ExplorerSession::reconnect`].
    pub fn disconnect(&mut self) -> bool {
        self.tables.clear();
        self.search.clear();
        self.analysis = None;

        match self.connection.take() {
            Some(connection) => {
                connection.close();
                true
            }
            None => false,
        }
    }

    /// Connect again with the parameters of the last connect call
    pub async fn reconnect(&mut self) -> Result<SessionStatus, AppError> {
        let params = self.last_params.clone().ok_or_else(|| {
            AppError::BadRequest("No previous connection to re-establish".to_string())
        })?;

        warn!("Re-establishing connection to '{}'", params.database);
        self.connect(params).await
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            connected: self.connection.is_some(),
            connection: self.connection.as_ref().map(ActiveConnection::info),
            table_count: self.tables.len(),
            search: self.search.clone(),
            analyzed_table: self.analysis.as_ref().map(|a| a.table.clone()),
            can_reconnect: self.last_params.is_some(),
        }
    }

    fn require_connection(&self) -> Result<&ActiveConnection, AppError> {
        self.connection.as_ref().ok_or_else(|| {
            AppError::NotConnected(
                "No active database connection. Use POST /api/session/connect first.".to_string(),
            )
        })
    }

    /// Catalog reader over the session connection, validated before use
    pub fn catalog(&self) -> Result<PostgresCatalog<'_>, AppError> {
        let client = self.require_connection()?.client()?;
        Ok(PostgresCatalog::new(client))
    }

    /// Filter the cached table list.
    ///
    /// A given query replaces the remembered search; without one the
    /// remembered search is applied again.
    pub fn search_tables(&mut self, query: Option<&str>) -> Result<Vec<String>, AppError> {
        self.require_connection()?;

        if let Some(query) = query {
            self.search = query.trim().to_string();
        }
        Ok(filter_tables(&self.tables, &self.search))
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Analyze a table from the cached list and remember the result
    pub async fn analyze(&mut self, table: &str) -> Result<&Analysis, AppError> {
        self.require_connection()?;
        self.ensure_known_table(table)?;

        let catalog = self.catalog()?;
        let result = analysis::analyze(&catalog, &self.tables, table).await?;
        drop(catalog);

        info!(
            "Analyzed '{}': {} related table(s), {} view(s), {} procedure(s), {} function(s), {} similar",
            table,
            result.dependencies.tables.len(),
            result.dependencies.views.len(),
            result.dependencies.procedures.len(),
            result.dependencies.functions.len(),
            result.similar_tables.len()
        );

        Ok(self.analysis.insert(result))
    }

    fn ensure_known_table(&self, table: &str) -> Result<(), AppError> {
        if self.tables.iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(not_found_error(format!("Table '{}' does not exist", table)))
        }
    }

    pub fn last_analysis(&self) -> Result<&Analysis, AppError> {
        self.analysis
            .as_ref()
            .ok_or_else(|| not_found_error("No table has been analyzed yet"))
    }

    /// Build the spreadsheet report for the last analysis
    pub async fn report(&self) -> Result<Report, AppError> {
        let analysis = self.last_analysis()?;
        let catalog = self.catalog()?;

        build_report(
            &catalog,
            &analysis.table,
            &analysis.dependencies,
            &analysis.similar_tables,
        )
        .await
    }
}

#[cfg(test)]
impl ExplorerSession {
    /// Disconnected session holding a finished analysis
    pub fn with_analysis(analysis: Analysis) -> Self {
        Self {
            analysis: Some(analysis),
            ..Self::default()
        }
    }
}

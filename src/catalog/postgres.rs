//! PostgreSQL catalog reader

use super::queries::{
    DEPENDENT_ROUTINES, DEPENDENT_VIEWS, FOREIGN_KEY_EDGES, LIST_TABLES, ROUTINE_DEFINITION,
    ROUTINE_PARAMETERS, TABLE_COLUMNS, VIEW_COLUMNS, VIEW_DEFINITION,
};
use super::{
    format_data_type, Catalog, ColumnDescriptor, ForeignKeyEdge, RoutineMetadata,
    RoutineParameter, ViewMetadata, DEFINITION_NOT_AVAILABLE,
};
use crate::error::AppError;
use deadpool_postgres::Client;
use tracing::debug;

/// Routine kinds as stored in `information_schema.routines` and `pg_proc`
#[derive(Debug, Clone, Copy)]
enum RoutineKind {
    Procedure,
    Function,
}

impl RoutineKind {
    fn routine_type(self) -> &'static str {
        match self {
            RoutineKind::Procedure => "PROCEDURE",
            RoutineKind::Function => "FUNCTION",
        }
    }

    fn prokind(self) -> &'static str {
        match self {
            RoutineKind::Procedure => "p",
            RoutineKind::Function => "f",
        }
    }
}

/// Catalog reader over the session connection
pub struct PostgresCatalog<'a> {
    client: &'a Client,
}

impl<'a> PostgresCatalog<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    async fn routine_metadata(
        &self,
        name: &str,
        kind: RoutineKind,
    ) -> Result<RoutineMetadata, AppError> {
        let routine_type = kind.routine_type();

        let definition_row = self
            .client
            .query_opt(ROUTINE_DEFINITION, &[&name, &routine_type])
            .await?;

        let definition = definition_row
            .as_ref()
            .and_then(|row| row.get::<_, Option<String>>("definition"))
            .unwrap_or_else(|| DEFINITION_NOT_AVAILABLE.to_string());

        let return_type = match kind {
            RoutineKind::Procedure => None,
            RoutineKind::Function => Some(
                definition_row
                    .as_ref()
                    .and_then(|row| {
                        let data_type: Option<String> = row.get("data_type");
                        data_type.map(|t| format_data_type(&t, row.get("max_length")))
                    })
                    .unwrap_or_else(|| DEFINITION_NOT_AVAILABLE.to_string()),
            ),
        };

        let rows = self
            .client
            .query(ROUTINE_PARAMETERS, &[&name, &routine_type])
            .await?;

        let parameters = rows
            .iter()
            .map(|row| {
                let data_type: String = row.get("data_type");
                RoutineParameter {
                    name: row
                        .get::<_, Option<String>>("parameter_name")
                        .unwrap_or_default(),
                    data_type: format_data_type(&data_type, row.get("max_length")),
                    mode: row
                        .get::<_, Option<String>>("parameter_mode")
                        .unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Read {} metadata for '{}': {} parameter(s)",
            routine_type.to_lowercase(),
            name,
            parameters.len()
        );

        Ok(RoutineMetadata {
            parameters,
            definition,
            return_type,
        })
    }

    async fn dependent_routines(&self, table: &str, kind: RoutineKind) -> Result<Vec<String>, AppError> {
        let rows = self
            .client
            .query(DEPENDENT_ROUTINES, &[&table, &kind.prokind()])
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }
}

impl Catalog for PostgresCatalog<'_> {
    async fn list_tables(&self) -> Result<Vec<String>, AppError> {
        let rows = self.client.query(LIST_TABLES, &[]).await?;
        Ok(rows.iter().map(|row| row.get("table_name")).collect())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, AppError> {
        let rows = self.client.query(TABLE_COLUMNS, &[&table]).await?;

        let columns = rows
            .iter()
            .map(|row| {
                let data_type: String = row.get("data_type");
                ColumnDescriptor {
                    name: row.get("column_name"),
                    data_type: format_data_type(&data_type, row.get("max_length")),
                    nullable: row.get("nullable"),
                    is_identity: row.get("is_identity"),
                    is_primary_key: row.get("is_primary_key"),
                }
            })
            .collect();

        Ok(columns)
    }

    async fn view_metadata(&self, view: &str) -> Result<ViewMetadata, AppError> {
        let rows = self.client.query(VIEW_COLUMNS, &[&view]).await?;

        let columns = rows
            .iter()
            .map(|row| {
                let data_type: String = row.get("data_type");
                ColumnDescriptor {
                    name: row.get("column_name"),
                    data_type: format_data_type(&data_type, row.get("max_length")),
                    nullable: row.get("nullable"),
                    is_identity: false,
                    is_primary_key: false,
                }
            })
            .collect();

        let definition = self
            .client
            .query_opt(VIEW_DEFINITION, &[&view])
            .await?
            .and_then(|row| row.get::<_, Option<String>>("definition"))
            .unwrap_or_else(|| DEFINITION_NOT_AVAILABLE.to_string());

        Ok(ViewMetadata { columns, definition })
    }

    async fn procedure_metadata(&self, procedure: &str) -> Result<RoutineMetadata, AppError> {
        self.routine_metadata(procedure, RoutineKind::Procedure).await
    }

    async fn function_metadata(&self, function: &str) -> Result<RoutineMetadata, AppError> {
        self.routine_metadata(function, RoutineKind::Function).await
    }

    async fn foreign_key_edges(&self, table: &str) -> Result<Vec<ForeignKeyEdge>, AppError> {
        let rows = self.client.query(FOREIGN_KEY_EDGES, &[&table]).await?;

        let edges = rows
            .iter()
            .map(|row| ForeignKeyEdge {
                constraint_name: row.get("constraint_name"),
                referencing_schema: row.get("referencing_schema"),
                referencing_table: row.get("referencing_table"),
                referencing_column: row.get("referencing_column"),
                referenced_schema: row.get("referenced_schema"),
                referenced_table: row.get("referenced_table"),
                referenced_column: row.get("referenced_column"),
            })
            .collect();

        Ok(edges)
    }

    async fn dependent_views(&self, table: &str) -> Result<Vec<String>, AppError> {
        let rows = self.client.query(DEPENDENT_VIEWS, &[&table]).await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn dependent_procedures(&self, table: &str) -> Result<Vec<String>, AppError> {
        self.dependent_routines(table, RoutineKind::Procedure).await
    }

    async fn dependent_functions(&self, table: &str) -> Result<Vec<String>, AppError> {
        self.dependent_routines(table, RoutineKind::Function).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routine_kind_mapping() {
        assert_eq!(RoutineKind::Procedure.routine_type(), "PROCEDURE");
        assert_eq!(RoutineKind::Function.routine_type(), "FUNCTION");
        assert_eq!(RoutineKind::Procedure.prokind(), "p");
        assert_eq!(RoutineKind::Function.prokind(), "f");
    }
}

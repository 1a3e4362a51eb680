//! Metadata Reader
//!
//! Read-only access to the database catalog: table enumeration, column
//! metadata for tables and views, routine metadata for procedures and
//! functions, foreign-key edges and dependent objects.

pub mod postgres;
pub mod queries;

pub use postgres::PostgresCatalog;

use crate::error::AppError;
use serde::Serialize;
use std::future::Future;

/// Text used when a view or routine definition cannot be read
pub const DEFINITION_NOT_AVAILABLE: &str = "Definition not available";

/// Length value the catalog reports for unbounded ("MAX") types
pub const UNBOUNDED_LENGTH: i32 = -1;

/// Format a catalog data type with its length qualifier.
///
/// `VARCHAR` + `Some(50)` gives `VARCHAR(50)`, `VARCHAR` + `Some(-1)` gives
/// `VARCHAR(MAX)`, and a missing length leaves the base type untouched.
pub fn format_data_type(base: &str, max_length: Option<i32>) -> String {
    match max_length {
        Some(UNBOUNDED_LENGTH) => format!("{}(MAX)", base),
        Some(len) => format!("{}({})", base, len),
        None => base.to_string(),
    }
}

/// Column of a table or view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_identity: bool,
    pub is_primary_key: bool,
}

/// Declared foreign-key column pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyEdge {
    pub constraint_name: String,
    pub referencing_schema: String,
    pub referencing_table: String,
    pub referencing_column: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Procedure or function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineParameter {
    pub name: String,
    pub data_type: String,
    pub mode: String,
}

/// Metadata of a stored procedure or function.
///
/// `return_type` is only populated for functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineMetadata {
    pub parameters: Vec<RoutineParameter>,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

/// Columns and definition of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewMetadata {
    pub columns: Vec<ColumnDescriptor>,
    pub definition: String,
}

/// Read-only catalog queries the analysis pipeline depends on.
///
/// Every method issues one logical query and runs it to completion; nothing
/// is cached at this level.
pub trait Catalog {
    /// Base tables ordered by name
    fn list_tables(&self) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    /// Columns of a table in ordinal order; empty when the table is unknown
    fn table_columns(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<ColumnDescriptor>, AppError>> + Send;

    fn view_metadata(
        &self,
        view: &str,
    ) -> impl Future<Output = Result<ViewMetadata, AppError>> + Send;

    fn procedure_metadata(
        &self,
        procedure: &str,
    ) -> impl Future<Output = Result<RoutineMetadata, AppError>> + Send;

    fn function_metadata(
        &self,
        function: &str,
    ) -> impl Future<Output = Result<RoutineMetadata, AppError>> + Send;

    /// Foreign-key edges where the table is the referencing or the referenced
    /// side, ordered by (referenced table, referencing table)
    fn foreign_key_edges(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<ForeignKeyEdge>, AppError>> + Send;

    fn dependent_views(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    fn dependent_procedures(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    fn dependent_functions(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;
}

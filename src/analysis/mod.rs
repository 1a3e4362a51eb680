//! Table analysis pipeline
//!
//! Dependency resolution, similar-name lookup and diagram composition for one
//! selected table.

pub mod dependencies;
pub mod similar;

pub use dependencies::{resolve_dependencies, Dependencies, DependencySet};
pub use similar::{filter_tables, find_similar_tables};

use crate::catalog::{Catalog, ForeignKeyEdge};
use crate::diagram::compose_er_diagram;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of analyzing a selected table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub table: String,
    pub dependencies: DependencySet,
    pub similar_tables: Vec<String>,
    pub relationships: Vec<ForeignKeyEdge>,
    /// Mermaid ER diagram; `None` when the table has no foreign keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Run the full analysis of `table` against the cached table list
pub async fn analyze<C>(catalog: &C, tables: &[String], table: &str) -> Result<Analysis, AppError>
where
    C: Catalog + Sync,
{
    let Dependencies { set, edges } = resolve_dependencies(catalog, table).await?;
    let similar_tables = find_similar_tables(tables, table);
    let diagram = (!edges.is_empty()).then(|| compose_er_diagram(&edges));

    Ok(Analysis {
        table: table.to_string(),
        dependencies: set,
        similar_tables,
        relationships: edges,
        diagram,
        analyzed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;

    #[tokio::test]
    async fn test_analyze_sales_table() {
        let catalog = MemoryCatalog::with_tables(&["CUSTOMERS_", "GEO_", "PRODUCT_", "SALES_", "SALES_2023"])
            .edge("SALES_", "PRODUCT_ID", "PRODUCT_", "PRODUCT_ID")
            .edge("SALES_", "CUSTOMER_ID", "CUSTOMERS_", "CUSTOMER_ID")
            .edge("SALES_", "STATE_AB", "GEO_", "STATE_AB");
        let tables = catalog.tables.clone();

        let analysis = analyze(&catalog, &tables, "SALES_").await.unwrap();

        assert_eq!(analysis.similar_tables, vec!["SALES_2023"]);
        let diagram = analysis.diagram.expect("diagram for a table with foreign keys");
        assert_eq!(diagram.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_analyze_without_relationships_has_no_diagram() {
        let catalog = MemoryCatalog::with_tables(&["settings"]);
        let tables = catalog.tables.clone();

        let analysis = analyze(&catalog, &tables, "settings").await.unwrap();

        assert!(analysis.dependencies.is_empty());
        assert!(analysis.similar_tables.is_empty());
        assert!(analysis.diagram.is_none());
    }
}

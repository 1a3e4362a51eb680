//! Dependency Resolver
//!
//! Collects everything structurally tied to a table: partner tables through
//! declared foreign keys and the views, procedures and functions whose
//! definitions reference it.

use crate::catalog::{Catalog, ForeignKeyEdge};
use crate::error::AppError;
use serde::Serialize;
use tracing::{debug, info};

/// Objects related to a selected table, each list duplicate-free in query order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySet {
    pub tables: Vec<String>,
    pub views: Vec<String>,
    pub procedures: Vec<String>,
    pub functions: Vec<String>,
}

impl DependencySet {
    /// Build the set from raw query results.
    ///
    /// Partner tables come from both sides of every edge; the selected table
    /// itself never appears.
    pub fn from_parts(
        table: &str,
        edges: &[ForeignKeyEdge],
        views: Vec<String>,
        procedures: Vec<String>,
        functions: Vec<String>,
    ) -> Self {
        let mut tables = Vec::new();
        for edge in edges {
            for name in [&edge.referencing_table, &edge.referenced_table] {
                if name != table {
                    push_unique(&mut tables, name.clone());
                }
            }
        }

        Self {
            tables,
            views: dedup(views),
            procedures: dedup(procedures),
            functions: dedup(functions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.views.is_empty()
            && self.procedures.is_empty()
            && self.functions.is_empty()
    }
}

/// Dependency set plus the foreign-key edges it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    pub set: DependencySet,
    pub edges: Vec<ForeignKeyEdge>,
}

/// Resolve the dependencies of `table`.
///
/// A table without foreign keys or dependents yields empty lists; that is
/// a normal outcome, not an error.
pub async fn resolve_dependencies<C>(catalog: &C, table: &str) -> Result<Dependencies, AppError>
where
    C: Catalog + Sync,
{
    debug!("Resolving dependencies for table '{}'", table);

    let edges = catalog.foreign_key_edges(table).await?;
    let views = catalog.dependent_views(table).await?;
    let procedures = catalog.dependent_procedures(table).await?;
    let functions = catalog.dependent_functions(table).await?;

    let set = DependencySet::from_parts(table, &edges, views, procedures, functions);

    info!(
        "Table '{}': {} related table(s), {} view(s), {} procedure(s), {} function(s), {} FK edge(s)",
        table,
        set.tables.len(),
        set.views.len(),
        set.procedures.len(),
        set.functions.len(),
        edges.len()
    );

    Ok(Dependencies { set, edges })
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        push_unique(&mut unique, item);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use pretty_assertions::assert_eq;

    fn sales_catalog() -> MemoryCatalog {
        MemoryCatalog::with_tables(&["CUSTOMERS_", "GEO_", "PRODUCT_", "SALES_"])
            .edge("SALES_", "PRODUCT_ID", "PRODUCT_", "PRODUCT_ID")
            .edge("SALES_", "CUSTOMER_ID", "CUSTOMERS_", "CUSTOMER_ID")
            .edge("SALES_", "STATE_AB", "GEO_", "STATE_AB")
    }

    #[tokio::test]
    async fn test_outgoing_foreign_keys_are_related_tables() {
        let deps = resolve_dependencies(&sales_catalog(), "SALES_").await.unwrap();

        let mut tables = deps.set.tables.clone();
        tables.sort();
        assert_eq!(tables, vec!["CUSTOMERS_", "GEO_", "PRODUCT_"]);
        assert_eq!(deps.edges.len(), 3);
    }

    #[tokio::test]
    async fn test_incoming_foreign_keys_are_related_tables() {
        let deps = resolve_dependencies(&sales_catalog(), "PRODUCT_").await.unwrap();

        assert_eq!(deps.set.tables, vec!["SALES_"]);
        assert_eq!(deps.edges.len(), 1);
    }

    #[tokio::test]
    async fn test_isolated_table_is_not_an_error() {
        let catalog = MemoryCatalog::with_tables(&["audit_log"]);
        let deps = resolve_dependencies(&catalog, "audit_log").await.unwrap();

        assert!(deps.set.is_empty());
        assert!(deps.edges.is_empty());
    }

    #[tokio::test]
    async fn test_dependents_are_deduplicated_in_order() {
        let mut catalog = MemoryCatalog::with_tables(&["orders"]);
        catalog.dependents.insert(
            "orders".to_string(),
            (
                vec!["v_open_orders".into(), "v_totals".into(), "v_open_orders".into()],
                vec!["close_order".into()],
                vec!["order_total".into(), "order_total".into()],
            ),
        );

        let deps = resolve_dependencies(&catalog, "orders").await.unwrap();

        assert_eq!(deps.set.views, vec!["v_open_orders", "v_totals"]);
        assert_eq!(deps.set.procedures, vec!["close_order"]);
        assert_eq!(deps.set.functions, vec!["order_total"]);
    }

    #[test]
    fn test_self_reference_excludes_selected_table() {
        let catalog = MemoryCatalog::default()
            .edge("employees", "manager_id", "employees", "id")
            .edge("timesheets", "employee_id", "employees", "id");

        let set = DependencySet::from_parts("employees", &catalog.edges, vec![], vec![], vec![]);

        assert_eq!(set.tables, vec!["timesheets"]);
    }
}

//! Entity-relationship diagrams
//!
//! Composes Mermaid `erDiagram` text from foreign-key edges and defines the
//! rendering capability used to turn that text into a PNG.

pub mod kroki;

pub use kroki::KrokiRenderer;

use crate::catalog::ForeignKeyEdge;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use thiserror::Error;

/// Failure while turning diagram text into an image
#[derive(Error, Debug)]
pub enum RenderError {
    /// The service answered with a non-success status
    #[error("Service responded with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The service answered 2xx but the body is not a decodable image
    #[error("Service returned an unreadable image ({reason})")]
    InvalidImage { reason: String, response: String },

    #[error("Request to rendering service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}

impl RenderError {
    /// Raw text returned by the rendering service, kept for diagnosis
    pub fn service_response(&self) -> Option<&str> {
        match self {
            RenderError::Rejected { body, .. } => Some(body),
            RenderError::InvalidImage { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Renders diagram source text into PNG bytes
pub trait DiagramRenderer {
    fn render(&self, source: &str) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send;
}

/// Build a Mermaid ER diagram from foreign-key edges.
///
/// One line per distinct (referencing table, referenced table, referencing
/// column, referenced column), in first-seen order. Edges that differ only in
/// constraint name collapse into one line.
pub fn compose_er_diagram(edges: &[ForeignKeyEdge]) -> String {
    let mut lines = vec!["erDiagram".to_string()];
    let mut seen: HashSet<(&str, &str, &str, &str)> = HashSet::new();
    let mut entities = EntityNames::default();

    for edge in edges {
        let key = (
            edge.referencing_table.as_str(),
            edge.referenced_table.as_str(),
            edge.referencing_column.as_str(),
            edge.referenced_column.as_str(),
        );
        if !seen.insert(key) {
            continue;
        }

        let referenced = entities.name_for(&edge.referenced_table);
        let referencing = entities.name_for(&edge.referencing_table);
        lines.push(format!(
            "    {} ||--o{{ {} : \"{}\"",
            referenced,
            referencing,
            edge.referencing_column.replace('"', "'")
        ));
    }

    lines.join("\n")
}

/// Mermaid entity names are limited to word characters and hyphens
fn escape_entity(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Assigns each table one entity name, distinct from every other table's.
///
/// Tables whose escaped names collide get a numeric suffix in first-seen
/// order.
#[derive(Debug, Default)]
struct EntityNames {
    by_table: HashMap<String, String>,
    taken: HashSet<String>,
}

impl EntityNames {
    fn name_for(&mut self, table: &str) -> String {
        if let Some(name) = self.by_table.get(table) {
            return name.clone();
        }

        let base = escape_entity(table);
        let mut name = base.clone();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }

        self.taken.insert(name.clone());
        self.by_table.insert(table.to_string(), name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(constraint: &str, referencing: &str, column: &str, referenced: &str, referenced_column: &str) -> ForeignKeyEdge {
        ForeignKeyEdge {
            constraint_name: constraint.to_string(),
            referencing_schema: "public".to_string(),
            referencing_table: referencing.to_string(),
            referencing_column: column.to_string(),
            referenced_schema: "public".to_string(),
            referenced_table: referenced.to_string(),
            referenced_column: referenced_column.to_string(),
        }
    }

    #[test]
    fn test_sales_diagram() {
        let edges = vec![
            edge("fk_product", "SALES_", "PRODUCT_ID", "PRODUCT_", "PRODUCT_ID"),
            edge("fk_customer", "SALES_", "CUSTOMER_ID", "CUSTOMERS_", "CUSTOMER_ID"),
            edge("fk_geo", "SALES_", "STATE_AB", "GEO_", "STATE_AB"),
        ];

        let diagram = compose_er_diagram(&edges);

        assert_eq!(
            diagram,
            "erDiagram\n    \
             PRODUCT_ ||--o{ SALES_ : \"PRODUCT_ID\"\n    \
             CUSTOMERS_ ||--o{ SALES_ : \"CUSTOMER_ID\"\n    \
             GEO_ ||--o{ SALES_ : \"STATE_AB\""
        );
    }

    #[test]
    fn test_duplicate_tuples_collapse() {
        let edges = vec![
            edge("fk_a", "orders", "customer_id", "customers", "id"),
            edge("fk_b", "orders", "customer_id", "customers", "id"),
            edge("fk_c", "orders", "billing_customer_id", "customers", "id"),
            edge("fk_a", "orders", "customer_id", "customers", "id"),
        ];

        let diagram = compose_er_diagram(&edges);

        // header + two distinct tuples
        assert_eq!(diagram.lines().count(), 3);
        assert_eq!(compose_er_diagram(&edges), diagram);
    }

    #[test]
    fn test_empty_edges_only_header() {
        assert_eq!(compose_er_diagram(&[]), "erDiagram");
    }

    #[test]
    fn test_entity_names_are_escaped() {
        let edges = vec![edge("fk", "order items", "order_id", "orders", "id")];
        assert!(compose_er_diagram(&edges).contains("orders ||--o{ order_items : \"order_id\""));
    }

    #[test]
    fn test_colliding_entity_names_stay_distinct() {
        let edges = vec![
            edge("fk_spaced", "order items", "order_id", "orders", "id"),
            edge("fk_plain", "order_items", "order_id", "orders", "id"),
            edge("fk_spaced_again", "order items", "product_id", "products", "id"),
        ];

        let diagram = compose_er_diagram(&edges);

        assert_eq!(
            diagram,
            "erDiagram\n    \
             orders ||--o{ order_items : \"order_id\"\n    \
             orders ||--o{ order_items_2 : \"order_id\"\n    \
             products ||--o{ order_items : \"product_id\""
        );
    }

    #[test]
    fn test_service_response_exposed_for_rejections() {
        let err = RenderError::Rejected { status: 400, body: "bad syntax".to_string() };
        assert_eq!(err.service_response(), Some("bad syntax"));
        assert_eq!(RenderError::Encode("x".to_string()).service_response(), None);
    }
}

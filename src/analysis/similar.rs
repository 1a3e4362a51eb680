//! Similar-Name Finder and table search
//!
//! Guesses relatedness from naming conventions. The heuristic is deliberately
//! loose: the full lowercased name is always a candidate prefix, so a short
//! name prefix-matches every longer name that starts with it.

use once_cell::sync::Lazy;
use regex::Regex;

/// First camel-case token: optional capital followed by lowercase letters
static CAMEL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]?[a-z]+").unwrap());

/// Candidate prefixes for `name`, in derivation order
pub fn candidate_prefixes(name: &str) -> Vec<String> {
    let mut prefixes = Vec::with_capacity(4);

    if let Some((head, _)) = name.split_once('_') {
        if !head.is_empty() {
            prefixes.push(head.to_lowercase());
        }
    }

    if let Some(token) = CAMEL_TOKEN.find(name) {
        prefixes.push(token.as_str().to_lowercase());
    }

    let head: Vec<char> = name.chars().take(4).collect();
    if head.len() == 4 && head.iter().all(|c| c.is_alphabetic()) {
        prefixes.push(head.into_iter().collect::<String>().to_lowercase());
    }

    prefixes.push(name.to_lowercase());
    prefixes
}

/// Tables whose lowercase name starts with any candidate prefix of `selected`.
///
/// Results keep the order of `tables`; the selected table is excluded
/// case-insensitively.
pub fn find_similar_tables(tables: &[String], selected: &str) -> Vec<String> {
    let prefixes = candidate_prefixes(selected);
    let selected_lower = selected.to_lowercase();

    tables
        .iter()
        .filter(|table| {
            let lower = table.to_lowercase();
            lower != selected_lower && prefixes.iter().any(|p| lower.starts_with(p.as_str()))
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring search; an empty query keeps every table
pub fn filter_tables(tables: &[String], query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return tables.to_vec();
    }

    tables
        .iter()
        .filter(|table| table.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefixes_for_underscored_name() {
        assert_eq!(
            candidate_prefixes("work_items"),
            vec!["work", "work", "work", "work_items"]
        );
    }

    #[test]
    fn test_prefixes_for_camel_case_name() {
        assert_eq!(
            candidate_prefixes("WorkOrderLines"),
            vec!["work", "work", "workorderlines"]
        );
    }

    #[test]
    fn test_prefixes_degenerate_to_full_name() {
        assert_eq!(candidate_prefixes("T1_"), vec!["t1", "t1_"]);
        assert_eq!(candidate_prefixes("42X9"), vec!["42x9"]);
    }

    #[test]
    fn test_workorders_finds_work_items() {
        let tables = names(&["workorders", "work_items", "orders"]);
        assert_eq!(find_similar_tables(&tables, "workorders"), vec!["work_items"]);
    }

    #[test]
    fn test_degenerate_prefix_only_excludes_exact_match() {
        let tables = names(&["4242", "4242", "42420", "4242_archive", "4243", "x4242"]);

        assert_eq!(
            find_similar_tables(&tables, "4242"),
            vec!["42420", "4242_archive"]
        );
    }

    #[test]
    fn test_selected_table_excluded_case_insensitively() {
        let tables = names(&["Customers", "CUSTOMERS", "customer_notes", "Cust"]);

        assert_eq!(
            find_similar_tables(&tables, "customers"),
            vec!["customer_notes", "Cust"]
        );
    }

    #[test]
    fn test_results_follow_table_order() {
        let tables = names(&["sales_2024", "geo", "SALES_archive", "sales_"]);

        assert_eq!(
            find_similar_tables(&tables, "SALES_"),
            vec!["sales_2024", "SALES_archive"]
        );
    }

    #[test]
    fn test_filter_tables() {
        let tables = names(&["Customers", "orders", "order_items"]);

        assert_eq!(filter_tables(&tables, "ORDER"), vec!["orders", "order_items"]);
        assert_eq!(filter_tables(&tables, ""), tables);
        assert!(filter_tables(&tables, "invoice").is_empty());
    }
}

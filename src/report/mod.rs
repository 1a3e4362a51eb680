//! Report Builder
//!
//! Assembles the metadata report for an analyzed table: a summary of every
//! discovered object and one detail sheet per object. [`xlsx`] turns the
//! result into a workbook.

pub mod xlsx;

pub use xlsx::write_xlsx;

use crate::analysis::DependencySet;
use crate::catalog::{Catalog, ColumnDescriptor, RoutineMetadata, RoutineParameter, ViewMetadata};
use crate::error::AppError;
use std::collections::HashSet;
use tracing::{debug, info};

/// Maximum sheet name length accepted by spreadsheet applications
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters that may not appear in a sheet name
const INVALID_SHEET_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

pub const SUMMARY_SHEET: &str = "Summary";
pub const SUMMARY_HEADER: [&str; 3] = ["Object Type", "Count", "Objects"];

/// Category of a reported object, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
}

impl ObjectKind {
    pub fn summary_label(self) -> &'static str {
        match self {
            ObjectKind::Table => "Tables",
            ObjectKind::View => "Views",
            ObjectKind::Procedure => "Stored Procedures",
            ObjectKind::Function => "Functions",
        }
    }
}

/// One row of the summary sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub kind: ObjectKind,
    pub count: usize,
    pub objects: String,
}

/// Type-specific metadata shown on a detail sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetBody {
    Table(Vec<ColumnDescriptor>),
    View(ViewMetadata),
    Procedure(RoutineMetadata),
    Function(RoutineMetadata),
}

impl SheetBody {
    pub fn kind(&self) -> ObjectKind {
        match self {
            SheetBody::Table(_) => ObjectKind::Table,
            SheetBody::View(_) => ObjectKind::View,
            SheetBody::Procedure(_) => ObjectKind::Procedure,
            SheetBody::Function(_) => ObjectKind::Function,
        }
    }
}

/// Detail sheet for a single object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSheet {
    pub sheet_name: String,
    pub object_name: String,
    pub body: SheetBody,
}

impl DetailSheet {
    /// Sheet content as rows of text cells; an empty row is a blank line
    pub fn rows(&self) -> Vec<Vec<String>> {
        let name = &self.object_name;
        let mut rows: Vec<Vec<String>> = Vec::new();

        match &self.body {
            SheetBody::Table(columns) => {
                rows.push(vec![format!("Table Metadata: {}", name)]);
                rows.push(vec![]);
                rows.push(cells(&["Column Name", "Data Type", "Nullable", "Identity", "Primary Key"]));
                rows.extend(columns.iter().map(|c| {
                    vec![
                        c.name.clone(),
                        c.data_type.clone(),
                        yes_no(c.nullable),
                        yes_no(c.is_identity),
                        yes_no(c.is_primary_key),
                    ]
                }));
            }
            SheetBody::View(view) => {
                rows.push(vec![format!("View Metadata: {}", name)]);
                rows.push(vec![]);
                rows.push(cells(&["View Columns:"]));
                rows.push(cells(&["Column Name", "Data Type", "Nullable"]));
                rows.extend(
                    view.columns
                        .iter()
                        .map(|c| vec![c.name.clone(), c.data_type.clone(), yes_no(c.nullable)]),
                );
                rows.push(vec![]);
                rows.push(cells(&["View Definition:"]));
                rows.push(vec![view.definition.clone()]);
            }
            SheetBody::Procedure(routine) => {
                rows.push(vec![format!("Stored Procedure Metadata: {}", name)]);
                rows.push(vec![]);
                push_parameters(&mut rows, &routine.parameters);
                rows.push(vec![]);
                rows.push(cells(&["Procedure Definition:"]));
                rows.push(vec![routine.definition.clone()]);
            }
            SheetBody::Function(routine) => {
                rows.push(vec![format!("Function Metadata: {}", name)]);
                rows.push(vec![]);
                rows.push(cells(&["Return Type:"]));
                rows.push(vec![routine.return_type.clone().unwrap_or_default()]);
                if !routine.parameters.is_empty() {
                    rows.push(vec![]);
                    push_parameters(&mut rows, &routine.parameters);
                }
                rows.push(vec![]);
                rows.push(cells(&["Function Definition:"]));
                rows.push(vec![routine.definition.clone()]);
            }
        }

        rows
    }
}

/// Complete report for one analyzed table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub selected_table: String,
    pub summary: Vec<SummaryRow>,
    pub sheets: Vec<DetailSheet>,
}

impl Report {
    /// Download file name for the workbook
    pub fn file_name(&self) -> String {
        format!("DB_Metadata_{}.xlsx", self.selected_table)
    }
}

/// Truncate to 31 characters and strip the characters `:\/?*[]`
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .take(MAX_SHEET_NAME_LEN)
        .filter(|c| !INVALID_SHEET_CHARS.contains(c))
        .collect()
}

/// Hands out sheet names that are unique case-insensitively
#[derive(Debug)]
struct SheetNames {
    taken: HashSet<String>,
}

impl SheetNames {
    fn new() -> Self {
        let mut taken = HashSet::new();
        taken.insert(SUMMARY_SHEET.to_lowercase());
        // Reserved by Excel
        taken.insert("history".to_string());
        Self { taken }
    }

    fn claim(&mut self, object_name: &str) -> String {
        let sanitized = sanitize_sheet_name(object_name);
        let base = sanitized.trim_matches('\'');
        let base = if base.is_empty() { "Sheet" } else { base };

        let mut candidate = base.to_string();
        let mut n = 1;
        while self.taken.contains(&candidate.to_lowercase()) {
            let suffix = n.to_string();
            let keep = MAX_SHEET_NAME_LEN - suffix.len();
            let stem: String = base.chars().take(keep).collect();
            candidate = format!("{}{}", stem.trim_end_matches('\''), suffix);
            n += 1;
        }

        self.taken.insert(candidate.to_lowercase());
        candidate
    }
}

/// Build the report for `selected` from its analysis results.
///
/// Every object gets exactly one detail sheet; an object listed under several
/// categories is reported as the first of table, view, procedure, function.
/// Any metadata failure aborts the whole report.
pub async fn build_report<C>(
    catalog: &C,
    selected: &str,
    dependencies: &DependencySet,
    similar_tables: &[String],
) -> Result<Report, AppError>
where
    C: Catalog + Sync,
{
    let mut table_objects = vec![selected.to_string()];
    for name in dependencies.tables.iter().chain(similar_tables) {
        if !table_objects.contains(name) {
            table_objects.push(name.clone());
        }
    }

    let categories: [(ObjectKind, &[String]); 4] = [
        (ObjectKind::Table, &table_objects),
        (ObjectKind::View, &dependencies.views),
        (ObjectKind::Procedure, &dependencies.procedures),
        (ObjectKind::Function, &dependencies.functions),
    ];

    let summary: Vec<SummaryRow> = categories
        .iter()
        .filter(|(kind, objects)| *kind == ObjectKind::Table || !objects.is_empty())
        .map(|(kind, objects)| SummaryRow {
            kind: *kind,
            count: objects.len(),
            objects: objects.join(", "),
        })
        .collect();

    let mut names = SheetNames::new();
    let mut reported: HashSet<&str> = HashSet::new();
    let mut sheets = Vec::new();

    for (_, objects) in &categories {
        for object in objects.iter() {
            if !reported.insert(object.as_str()) {
                continue;
            }

            let Some(kind) = classify(object, &categories) else {
                continue;
            };

            debug!("Collecting {:?} metadata for '{}'", kind, object);

            let body = match kind {
                ObjectKind::Table => SheetBody::Table(catalog.table_columns(object).await?),
                ObjectKind::View => SheetBody::View(catalog.view_metadata(object).await?),
                ObjectKind::Procedure => SheetBody::Procedure(catalog.procedure_metadata(object).await?),
                ObjectKind::Function => SheetBody::Function(catalog.function_metadata(object).await?),
            };

            sheets.push(DetailSheet {
                sheet_name: names.claim(object),
                object_name: object.clone(),
                body,
            });
        }
    }

    info!(
        "Built report for '{}': {} summary row(s), {} detail sheet(s)",
        selected,
        summary.len(),
        sheets.len()
    );

    Ok(Report {
        selected_table: selected.to_string(),
        summary,
        sheets,
    })
}

/// First category (in precedence order) that lists the object
fn classify(object: &str, categories: &[(ObjectKind, &[String])]) -> Option<ObjectKind> {
    categories
        .iter()
        .find(|(_, objects)| objects.iter().any(|o| o == object))
        .map(|(kind, _)| *kind)
}

fn push_parameters(rows: &mut Vec<Vec<String>>, parameters: &[RoutineParameter]) {
    if parameters.is_empty() {
        return;
    }
    rows.push(cells(&["Parameters:"]));
    rows.push(cells(&["Parameter Name", "Data Type", "Mode"]));
    rows.extend(
        parameters
            .iter()
            .map(|p| vec![p.name.clone(), p.data_type.clone(), p.mode.clone()]),
    );
}

fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "YES" } else { "NO" };
    text.to_string()
}

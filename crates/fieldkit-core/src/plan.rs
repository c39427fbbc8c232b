//! # Plan Lookup
//!
//! Reference rows from the network plan spreadsheet, exported as CSV.
//! A row suggests the technology of a node by name; the validator falls
//! back to it when the draft leaves technology unset.
//!
//! Expected header (case-insensitive, extra columns ignored):
//!
//! ```text
//! node,technology
//! NODE-001,RPHY
//! ```
//!
//! The Spanish headers `nodo` and `tecnologia` are accepted too.

use crate::primitives::MAX_PLAN_FILE_SIZE;
use crate::{FieldError, Technology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// One plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    pub node_name: String,
    /// Parsed technology, `None` when the sheet holds an unknown value.
    pub technology: Option<Technology>,
    /// The technology cell as written in the sheet.
    pub raw_technology: String,
}

/// Plan rows keyed by normalized node name.
#[derive(Debug, Clone, Default)]
pub struct PlanTable {
    rows: BTreeMap<String, PlanRow>,
}

fn normalize_key(node_name: &str) -> String {
    node_name.trim().to_uppercase()
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

impl PlanTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse plan rows from CSV.
    ///
    /// Rows with an empty node cell are skipped. Later rows for the same node
    /// replace earlier ones.
    pub fn from_reader(reader: impl Read) -> Result<Self, FieldError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| FieldError::DeserializationError(format!("plan header: {}", e)))?
            .clone();
        let node_col = find_column(&headers, &["node", "nodo"]).ok_or_else(|| {
            FieldError::InvalidInput("plan CSV has no 'node' column".to_string())
        })?;
        let tech_col = find_column(&headers, &["technology", "tecnologia"]).ok_or_else(|| {
            FieldError::InvalidInput("plan CSV has no 'technology' column".to_string())
        })?;

        let mut table = Self::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| {
                FieldError::DeserializationError(format!("plan row {}: {}", line + 2, e))
            })?;
            let node_name = record.get(node_col).unwrap_or_default();
            if node_name.is_empty() {
                continue;
            }
            let raw_technology = record.get(tech_col).unwrap_or_default().to_string();
            table.insert(PlanRow {
                node_name: node_name.to_string(),
                technology: raw_technology.parse().ok(),
                raw_technology,
            });
        }
        Ok(table)
    }

    /// Load plan rows from a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FieldError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|e| FieldError::IoError(format!("plan file {}: {}", path.display(), e)))?;
        if metadata.len() > MAX_PLAN_FILE_SIZE {
            return Err(FieldError::InvalidInput(format!(
                "plan file is {} bytes, limit is {}",
                metadata.len(),
                MAX_PLAN_FILE_SIZE
            )));
        }
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        tracing::info!(rows = table.len(), path = %path.display(), "Loaded plan");
        Ok(table)
    }

    /// Add or replace a row.
    pub fn insert(&mut self, row: PlanRow) {
        self.rows.insert(normalize_key(&row.node_name), row);
    }

    /// Find the row for a node name, ignoring case and surrounding spaces.
    #[must_use]
    pub fn lookup(&self, node_name: &str) -> Option<&PlanRow> {
        self.rows.get(&normalize_key(node_name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_ignores_extra_columns() {
        let csv = "zone,Node,Technology\nN,NODE-001, rphy \nS,node-002,Legacy\n";
        let table = PlanTable::from_reader(csv.as_bytes()).expect("parse");

        assert_eq!(table.len(), 2);
        let row = table.lookup(" node-001 ").expect("row");
        assert_eq!(row.technology, Some(Technology::Rphy));
        assert_eq!(
            table.lookup("NODE-002").and_then(|r| r.technology),
            Some(Technology::Legacy)
        );
    }

    #[test]
    fn unknown_technology_keeps_row_without_suggestion() {
        let csv = "nodo,tecnologia\nN-9,FTTH\n";
        let table = PlanTable::from_reader(csv.as_bytes()).expect("parse");
        let row = table.lookup("n-9").expect("row exists");
        assert_eq!(row.technology, None);
        assert_eq!(row.raw_technology, "FTTH");
    }

    #[test]
    fn missing_columns_rejected() {
        let result = PlanTable::from_reader("name,kind\nA,B\n".as_bytes());
        assert!(matches!(result, Err(FieldError::InvalidInput(_))));
    }

    #[test]
    fn empty_node_cells_skipped() {
        let csv = "node,technology\n,RPHY\nN1,VCCAP\n";
        let table = PlanTable::from_reader(csv.as_bytes()).expect("parse");
        assert_eq!(table.len(), 1);
    }
}

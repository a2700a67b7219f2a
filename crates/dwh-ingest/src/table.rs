use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestError, Result};

/// A parsed CSV file: header plus rows, every row as wide as the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse the file at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            IngestError::Parse(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Parse comma-separated text with a header row.
    ///
    /// Blank lines are skipped. A row with fewer fields than the header is
    /// padded with empty cells; a row with more is rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::Parse(
                "No columns to parse from file".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for h in &headers {
            if !seen.insert(h.as_str()) {
                return Err(IngestError::Parse(format!("duplicate column name: {h:?}")));
            }
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if record.len() > headers.len() {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(IngestError::Parse(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    headers.len(),
                    line,
                    record.len()
                )));
            }
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// True when every name in `columns` is a header.
    pub fn has_columns(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.column_index(c).is_some())
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }
}

/// Cell at `idx`, with empty cells read as missing.
pub fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(String::as_str).filter(|v| !v.is_empty())
}

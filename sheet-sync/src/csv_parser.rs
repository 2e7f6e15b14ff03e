use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;

use crate::SheetError;

/// One data row keyed by lower-cased header name
pub type SheetRow = HashMap<String, String>;

/// Result of parsing a published sheet export
#[derive(Debug, Clone, PartialEq)]
pub enum SheetFetch {
    /// The sheet was reachable but holds no data rows (header only, or nothing)
    Empty,
    Rows(Vec<SheetRow>),
}

impl SheetFetch {
    pub fn len(&self) -> usize {
        match self {
            SheetFetch::Empty => 0,
            SheetFetch::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Quote-aware CSV reader for spreadsheet exports.
///
/// Handles doubled-quote escapes, commas and newlines inside quoted fields,
/// and both LF and CRLF record terminators. Fields are trimmed.
pub struct CsvParser {
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn parse_rows(&self, content: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| SheetError::Parse(e.to_string()))?;
            let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();

            // Rows with no content at all (",,,") carry nothing worth mapping
            if row.iter().all(|field| field.is_empty()) {
                continue;
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// First row is the header; every later row is zipped against it.
    /// Values past the last header are ignored, missing values leave the key absent.
    pub fn parse_sheet(&self, content: &str) -> Result<SheetFetch, SheetError> {
        let mut rows = self.parse_rows(content)?;

        if rows.len() <= 1 {
            return Ok(SheetFetch::Empty);
        }

        let headers: Vec<String> = rows
            .remove(0)
            .into_iter()
            .map(|header| header.trim().to_lowercase())
            .collect();

        let records = rows
            .into_iter()
            .map(|values| {
                let mut map = SheetRow::new();
                for (header, value) in headers.iter().zip(values) {
                    if !header.is_empty() {
                        map.insert(header.clone(), value);
                    }
                }
                map
            })
            .collect();

        Ok(SheetFetch::Rows(records))
    }
}

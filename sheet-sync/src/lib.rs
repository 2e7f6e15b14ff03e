//! Sheet Sync Crate
//!
//! Turns published spreadsheet exports into typed portal records and merges
//! them with what the portal already holds.
//!
//! # Architecture
//!
//! - **Types**: Record types are defined in the `shared-types` crate
//! - **Parsing**: `csv_parser` reads a CSV export into header-keyed rows
//! - **Mapping**: `mapping` turns rows into records and records into webhook payloads
//! - **Reconcile**: `reconcile` merges a remote snapshot with local data under a per-collection policy
//!
//! # Example
//!
//! ```rust,ignore
//! use sheet_sync::{map_rows, reconcile, CsvParser, MergePolicy, SheetFetch};
//! use shared_types::Alliance;
//!
//! if let SheetFetch::Rows(rows) = CsvParser::new().parse_sheet(&body)? {
//!     let remote: Vec<Alliance> = map_rows(&rows, now);
//!     let outcome = reconcile(&local, remote, &MergePolicy::alliances(), now);
//! }
//! ```

pub mod csv_parser;
pub mod mapping;
pub mod reconcile;

pub use csv_parser::{CsvParser, SheetFetch, SheetRow};
pub use mapping::{map_rows, SheetRecord};
pub use reconcile::{
    reconcile, KeyStrategy, MergeOrder, MergeOutcome, MergePolicy, Reconcilable,
    ALLIANCE_GRACE_WINDOW_MINUTES,
};

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Request failed: {0}")]
    Http(String),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

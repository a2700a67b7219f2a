//! `dwh-ingest` — loads uploaded CSV files into `dwh_users` / `dwh_admin`.
//!
//! A file is routed by its header: if the columns cover the user shape the
//! rows go to `dwh_users`, if they cover the admin shape they go to
//! `dwh_admin`, both if both match. Every call returns a preview of the first
//! rows regardless of whether anything was inserted.

pub mod db;
pub mod error;
pub mod preview;
pub mod records;
pub mod router;
pub mod table;

pub use error::{IngestError, Result};
pub use preview::Preview;
pub use records::{AdminRecord, UserRecord};
pub use router::{IngestReport, IngestRouter};
pub use table::CsvTable;

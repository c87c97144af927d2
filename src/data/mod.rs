//! Data layer for the running log.
//!
//! Handles run records, aggregate statistics, the SQLite database and legacy CSV import.

pub mod import;
mod models;
mod storage;

pub use models::{
    format_duration, parse_date, parse_distance, parse_duration, MonthlyTotals, NewRun,
    RunRecord, Summary, TimeOfDay, YearlyTotals,
};
pub use storage::Storage;

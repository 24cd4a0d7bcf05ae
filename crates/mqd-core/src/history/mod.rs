//! Download history (SQLite via sqlx).
//!
//! Every successful info fetch is recorded as {title, url}; the table is kept
//! at a configurable number of most recent entries.

mod db;

pub use db::{HistoryDb, HistoryEntry};

//! Bulk username import.

mod csv_import;

pub use csv_import::{CsvImport, parse_usernames, read_usernames};

//! Leaderboard rendering
//!
//! Four generators, each exposed as a `generate` function writing to any
//! [`core::fmt::Write`]:
//! - **Console**: aligned table with optional ANSI colors
//! - **CSV**: one row per user with proper escaping
//! - **HTML**: self-contained page embedding each user's contribution graph
//! - **JSON**: machine-readable users and failures
//!
//! Every generator takes users already in display order; all but CSV also list
//! the failures. Column definitions shared by the tabular formats live in `common`.

mod common;
mod console;
mod csv;
mod html;
mod json;

pub use console::generate as generate_console;
pub use csv::generate as generate_csv;
pub use html::generate as generate_html;
pub use json::generate as generate_json;

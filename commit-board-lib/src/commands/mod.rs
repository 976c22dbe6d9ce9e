//! Command-line interface and orchestration for commit-board
//!
//! This module implements the CLI commands and wires the request pipeline,
//! the aggregator, and the leaderboard together. It handles argument parsing,
//! configuration management, and the high-level workflows.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **users**: Aggregate statistics for usernames given on the command line or
//!   imported from a CSV file, then render the leaderboard
//! - **rate-limit**: Show the remaining GitHub API quota for the current token
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler. The `users` command:
//!
//! 1. Loads configuration and builds the client, cache, retry and batch executors
//! 2. Gathers usernames from arguments and the optional CSV file
//! 3. Feeds them through the leaderboard, sequentially or in batches
//! 4. Optionally retries the users that failed
//! 5. Generates the requested reports and prints a summary notice
//!
//! The `common` module provides shared functionality like logging setup,
//! color mode handling, pipeline assembly, and report output.

mod common;
mod config;
mod host;
mod init;
mod progress_reporter;
mod rate_limit;
mod run;
mod users;

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use rate_limit::{RateLimitArgs, show_rate_limit};
pub use run::run;
pub use users::{UsersArgs, process_users};

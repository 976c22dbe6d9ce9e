#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for commit-board
//!
//! This library holds all functionality of the commit-board tool, which takes a list
//! of GitHub usernames and produces a leaderboard of their commit activity.
//!
//! # Module Organization
//!
//! - [`fetch`]: Request scheduling: clock, response cache, retry/backoff and batching
//! - [`github`]: Typed GitHub REST client and wire models
//! - [`stats`]: Handle validation and per-user statistics aggregation
//! - [`board`]: The leaderboard, which deduplicates, aggregates and tallies users
//! - [`input`]: Bulk username import from CSV files
//! - `commands`: Command-line interface and orchestration
//! - `reports`: Leaderboard rendering in multiple formats

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod board;
mod commands;
pub mod fetch;
pub mod github;
pub mod input;
mod reports;
pub mod stats;

pub use crate::commands::{Host, run};

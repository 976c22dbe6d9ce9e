//! Per-user commit statistics.

mod aggregator;
mod handle;
mod user_stats;

pub use aggregator::{Aggregator, AggregatorSettings, CacheTtls, DEFAULT_GRAPH_URL_TEMPLATE, StatsSource};
pub use handle::{MAX_HANDLE_LEN, is_valid_handle};
pub use user_stats::{FetchError, FetchFailure, Strategy, UserStatistics};

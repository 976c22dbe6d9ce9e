//! Request scheduling for a quota-limited remote API
//!
//! Every outbound request made by the aggregator flows through this module.
//!
//! # Implementation Model
//!
//! - [`Cache`]: an in-memory store of immutable JSON snapshots with per-entry TTLs,
//!   consulted before any network call
//! - [`RetryExecutor`]: wraps a single request with cache lookup and quota-aware
//!   retries (server reset time when known, exponential backoff otherwise)
//! - [`BatchExecutor`]: runs many independent requests with bounded concurrency,
//!   settling each one and pausing between groups
//! - [`Clock`]: the time source all of the above wait on, so tests can substitute a
//!   [`ManualClock`] and run without real delays
//!
//! The cache is the only state shared between concurrent aggregations.

mod api_error;
mod batch;
mod cache;
mod clock;
mod retry;

pub use api_error::ApiError;
pub use batch::{BatchExecutor, CancelToken, DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE};
pub use cache::Cache;
pub use clock::{Clock, ManualClock, TokioClock};
pub use retry::{DEFAULT_TTL, RESET_BUFFER, RetryExecutor, RetryPolicy, RetryState};

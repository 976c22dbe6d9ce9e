//! The leaderboard and the user-facing summaries of operations on it.

mod leaderboard;
mod notice;
mod progress;

pub use leaderboard::{AddMode, AddOutcome, DEFAULT_REQUEST_PAUSE, Leaderboard, SortKey, SortOrder};
pub use notice::{Notice, NoticeLevel, summary_notice};
pub use progress::{NoProgress, Progress};

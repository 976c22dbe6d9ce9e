use core::fmt::Debug;

/// A trait for reporting progress while usernames are being aggregated.
pub trait Progress: Send + Sync + Debug {
    /// A run over `total` usernames is starting.
    fn start(&self, total: u64);

    /// One username has settled, successfully or not.
    fn user_settled(&self, username: &str, success: bool);

    /// Finish and clear the progress indicator.
    fn done(&self);
}

/// Progress sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _total: u64) {}

    fn user_settled(&self, _username: &str, _success: bool) {}

    fn done(&self) {}
}

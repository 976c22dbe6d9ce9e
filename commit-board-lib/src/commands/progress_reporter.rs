use crate::board::Progress;
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Refresh rate for the elapsed-time display (10 Hz).
const REFRESH_INTERVAL_MS: u64 = 100;

const TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {pos}/{len} {msg}";
const TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{bar:25}] {pos}/{len} {msg}";

/// A progress bar on stderr tracking how many usernames have settled.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    ///
    /// When `visible` is false the bar is never drawn; it is still safe to drive.
    /// When `use_colors` is false, progress bar chrome is rendered without ANSI styling.
    #[must_use]
    pub fn new(visible: bool, use_colors: bool) -> Self {
        let bar = ProgressBar::hidden();
        if visible {
            bar.set_draw_target(ProgressDrawTarget::stderr());
        }

        Self { bar, use_colors }
    }

    fn style(&self) -> ProgressStyle {
        let template = if self.use_colors { TEMPLATE } else { TEMPLATE_NO_COLOR };
        ProgressStyle::default_bar()
            .template(template)
            .expect("could not create progress bar style")
            .progress_chars("=> ")
    }
}

impl Progress for ProgressReporter {
    fn start(&self, total: u64) {
        self.bar.set_style(self.style());
        self.bar.set_prefix("Fetching");
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message("");
        self.bar.enable_steady_tick(Duration::from_millis(REFRESH_INTERVAL_MS));
    }

    fn user_settled(&self, username: &str, success: bool) {
        let status = if success { "done" } else { "failed" };
        self.bar.set_message(format!("{username} {status}"));
        self.bar.inc(1);
    }

    fn done(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

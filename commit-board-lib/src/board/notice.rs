use super::AddOutcome;
use core::fmt::{Display, Formatter};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing summary of an add operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Turn an add tally into a notice.
///
/// Distinguishes "nothing to do", "all failed", "some failed" and "all succeeded".
#[must_use]
pub fn summary_notice(outcome: &AddOutcome) -> Notice {
    let AddOutcome { success, errors, skipped } = *outcome;

    let (level, mut message) = match (success, errors) {
        (0, 0) => (NoticeLevel::Info, "No new usernames to add".to_string()),
        (0, _) => (NoticeLevel::Error, format!("Could not add any of the {errors} user(s)")),
        (_, 0) => (NoticeLevel::Success, format!("Added {success} user(s)")),
        _ => (NoticeLevel::Warning, format!("Added {success} user(s), {errors} could not be added")),
    };

    if skipped > 0 {
        message.push_str(&format!(" ({skipped} already listed or duplicated)"));
    }

    Notice { level, message }
}

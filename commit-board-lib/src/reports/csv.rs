use super::common::COLUMNS;
use crate::Result;
use crate::stats::UserStatistics;
use core::fmt::Write;
use std::borrow::Cow;

pub fn generate<W: Write>(users: &[&UserStatistics], writer: &mut W) -> Result<()> {
    write!(writer, "username")?;
    for column in COLUMNS {
        write!(writer, ",{}", column.key)?;
    }
    writeln!(writer, ",total_commits,strategy,avatar_url,contribution_graph_url")?;

    for user in users {
        write!(writer, "{}", escape_csv(&user.username))?;
        for column in COLUMNS {
            write!(writer, ",{}", (column.value)(user))?;
        }
        writeln!(
            writer,
            ",{},{},{},{}",
            user.total_commits,
            user.strategy,
            escape_csv(&user.avatar_url),
            escape_csv(&user.contribution_graph_url)
        )?;
    }

    Ok(())
}

/// Escape a value for RFC compliant CSV output.
///
/// Wraps the value in double quotes if it contains commas, newlines, or double quotes.
/// Internal double quotes are doubled per the RFC.
fn escape_csv(s: &str) -> Cow<'_, str> {
    if s.contains('"') {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else if s.contains([',', '\n', '\r']) {
        Cow::Owned(format!("\"{s}\""))
    } else {
        Cow::Borrowed(s)
    }
}

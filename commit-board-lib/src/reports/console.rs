use super::common::COLUMNS;
use crate::Result;
use crate::stats::{FetchFailure, UserStatistics};
use core::fmt::Write;
use owo_colors::OwoColorize;

const ESTIMATE_MARKER: char = '*';

pub fn generate<W: Write>(users: &[&UserStatistics], failures: &[FetchFailure], use_colors: bool, writer: &mut W) -> Result<()> {
    if users.is_empty() {
        writeln!(writer, "No users on the leaderboard")?;
    } else {
        write_table(users, use_colors, writer)?;
    }

    if !failures.is_empty() {
        writeln!(writer)?;
        let heading = format!("Could not add {} user(s):", failures.len());
        if use_colors {
            writeln!(writer, "{}", heading.red().bold())?;
        } else {
            writeln!(writer, "{heading}")?;
        }

        for failure in failures {
            writeln!(writer, "  {}: {}", failure.username, failure.message())?;
        }
    }

    Ok(())
}

fn write_table<W: Write>(users: &[&UserStatistics], use_colors: bool, writer: &mut W) -> Result<()> {
    let rank_width = users.len().to_string().len().max(1);
    let name_width = users.iter().map(|u| u.username.len() + 1).max().unwrap_or(0).max("User".len());
    let values: Vec<Vec<String>> = users
        .iter()
        .map(|u| COLUMNS.iter().map(|c| (c.value)(u).to_string()).collect())
        .collect();
    let widths: Vec<usize> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| values.iter().filter_map(|row| row.get(i)).map(String::len).max().unwrap_or(0).max(c.header.len()))
        .collect();

    let mut header = format!("{:>rank_width$}  {:<name_width$}", "#", "User");
    for (column, width) in COLUMNS.iter().zip(&widths) {
        write!(header, "  {:>width$}", column.header)?;
    }

    if use_colors {
        writeln!(writer, "{}", header.bold())?;
    } else {
        writeln!(writer, "{header}")?;
    }

    for (index, (user, row)) in users.iter().zip(&values).enumerate() {
        let name = if user.strategy.is_estimate() {
            format!("{}{ESTIMATE_MARKER}", user.username)
        } else {
            user.username.clone()
        };

        let rank = index + 1;
        if use_colors {
            write!(writer, "{:>rank_width$}  {:<name_width$}", rank.dimmed(), name.cyan())?;
        } else {
            write!(writer, "{rank:>rank_width$}  {name:<name_width$}")?;
        }

        for (value, width) in row.iter().zip(&widths) {
            write!(writer, "  {value:>width$}")?;
        }
        writeln!(writer)?;
    }

    if users.iter().any(|u| u.strategy.is_estimate()) {
        writeln!(writer)?;
        writeln!(writer, "{ESTIMATE_MARKER} estimated from a sample of repositories")?;
    }

    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::reports::common::test_users;
    use crate::stats::FetchError;

    #[test]
    fn test_table_without_colors() {
        let users = test_users();
        let refs: Vec<&UserStatistics> = users.iter().collect();
        let mut output = String::new();

        generate(&refs, &[], false, &mut output).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("#  User    "));
        assert!(lines[0].contains("Commits"));
        assert!(lines[1].starts_with("1  octocat "));
        assert!(lines[1].contains("1200"));
        assert!(lines[2].starts_with("2  hubot*  "));
        assert!(output.contains("* estimated from a sample of repositories"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_columns_are_aligned() {
        let users = test_users();
        let refs: Vec<&UserStatistics> = users.iter().collect();
        let mut output = String::new();

        generate(&refs, &[], false, &mut output).unwrap();

        let lines: Vec<&str> = output.lines().take(3).collect();
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[1].len(), lines[2].len());
    }

    #[test]
    fn test_failures_are_listed() {
        let failures = vec![FetchFailure::new("bad", FetchError::NotFound)];
        let mut output = String::new();

        generate(&[], &failures, false, &mut output).unwrap();

        assert!(output.contains("No users on the leaderboard"));
        assert!(output.contains("Could not add 1 user(s):"));
        assert!(output.contains("  bad: user not found"));
    }

    #[test]
    fn test_colors_emit_ansi() {
        let users = test_users();
        let refs: Vec<&UserStatistics> = users.iter().collect();
        let mut output = String::new();

        generate(&refs, &[], true, &mut output).unwrap();

        assert!(output.contains('\u{1b}'));
    }
}

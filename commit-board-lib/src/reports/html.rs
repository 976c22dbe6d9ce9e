use super::common::{COLUMNS, profile_url};
use crate::Result;
use crate::stats::{FetchFailure, UserStatistics};
use chrono::{DateTime, Local};
use core::fmt::Write;

pub fn generate<W: Write>(users: &[&UserStatistics], failures: &[FetchFailure], timestamp: DateTime<Local>, writer: &mut W) -> Result<()> {
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "  <meta charset=\"UTF-8\">")?;
    writeln!(writer, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(writer, "  <title>Commit Leaderboard</title>")?;
    write_styles(writer)?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;

    write_header(writer, timestamp, users.len())?;

    if users.is_empty() {
        writeln!(writer, "  <p class=\"empty\">No users on the leaderboard.</p>")?;
    } else {
        write_table(writer, users)?;
        write_graphs(writer, users)?;
    }

    if !failures.is_empty() {
        write_failures(writer, failures)?;
    }

    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;
    Ok(())
}

fn write_styles<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "  <style>")?;
    writeln!(writer, "    :root {{")?;
    writeln!(writer, "      --bg-color: #f0f2f5;")?;
    writeln!(writer, "      --card-bg: #ffffff;")?;
    writeln!(writer, "      --text-color: #1a202c;")?;
    writeln!(writer, "      --text-secondary: #64748b;")?;
    writeln!(writer, "      --border-color: #e2e8f0;")?;
    writeln!(writer, "      --accent-color: #3b82f6;")?;
    writeln!(writer, "      --error-color: #dc2626;")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    @media (prefers-color-scheme: dark) {{")?;
    writeln!(writer, "      :root {{")?;
    writeln!(writer, "        --bg-color: #0f172a;")?;
    writeln!(writer, "        --card-bg: #1e293b;")?;
    writeln!(writer, "        --text-color: #e2e8f0;")?;
    writeln!(writer, "        --text-secondary: #94a3b8;")?;
    writeln!(writer, "        --border-color: #334155;")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "    }}")?;
    writeln!(
        writer,
        "    body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; background: var(--bg-color); color: var(--text-color); margin: 0; padding: 24px; }}"
    )?;
    writeln!(writer, "    .header h1 {{ margin: 0 0 4px 0; }}")?;
    writeln!(writer, "    .subtitle {{ color: var(--text-secondary); margin: 0 0 24px 0; }}")?;
    writeln!(
        writer,
        "    table {{ border-collapse: collapse; background: var(--card-bg); width: 100%; border-radius: 8px; overflow: hidden; }}"
    )?;
    writeln!(writer, "    th, td {{ padding: 8px 12px; border-bottom: 1px solid var(--border-color); }}")?;
    writeln!(writer, "    th {{ text-align: left; color: var(--text-secondary); font-weight: 600; }}")?;
    writeln!(writer, "    td.num, th.num {{ text-align: right; font-variant-numeric: tabular-nums; }}")?;
    writeln!(writer, "    td.user {{ display: flex; align-items: center; gap: 8px; }}")?;
    writeln!(writer, "    td.user img {{ width: 24px; height: 24px; border-radius: 50%; }}")?;
    writeln!(writer, "    a {{ color: var(--accent-color); text-decoration: none; }}")?;
    writeln!(writer, "    .estimate {{ color: var(--text-secondary); font-size: 0.8em; }}")?;
    writeln!(writer, "    .graph {{ background: var(--card-bg); margin-top: 16px; padding: 12px; border-radius: 8px; }}")?;
    writeln!(writer, "    .graph img {{ max-width: 100%; }}")?;
    writeln!(writer, "    .failures {{ margin-top: 24px; color: var(--error-color); }}")?;
    writeln!(writer, "  </style>")?;
    Ok(())
}

fn write_header<W: Write>(writer: &mut W, timestamp: DateTime<Local>, user_count: usize) -> Result<()> {
    let date = timestamp.format("%Y-%m-%d %H:%M").to_string();
    writeln!(writer, "  <div class=\"header\">")?;
    writeln!(writer, "    <h1>Commit Leaderboard</h1>")?;
    writeln!(
        writer,
        "    <p class=\"subtitle\">{user_count} user(s), produced by commit-board {} on {date}</p>",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_table<W: Write>(writer: &mut W, users: &[&UserStatistics]) -> Result<()> {
    writeln!(writer, "  <table>")?;
    writeln!(writer, "    <thead>")?;
    write!(writer, "      <tr><th class=\"num\">#</th><th>User</th>")?;
    for column in COLUMNS {
        write!(writer, "<th class=\"num\">{}</th>", html_escape(column.header))?;
    }
    writeln!(writer, "</tr>")?;
    writeln!(writer, "    </thead>")?;
    writeln!(writer, "    <tbody>")?;

    for (index, user) in users.iter().enumerate() {
        let username = html_escape(&user.username);
        write!(writer, "      <tr><td class=\"num\">{}</td>", index + 1)?;
        write!(
            writer,
            "<td class=\"user\"><img src=\"{}\" alt=\"\"><a href=\"{}\">{username}</a>",
            html_escape(&user.avatar_url),
            html_escape(&profile_url(&user.username))
        )?;
        if user.strategy.is_estimate() {
            write!(writer, " <span class=\"estimate\">(estimated)</span>")?;
        }
        write!(writer, "</td>")?;

        for column in COLUMNS {
            write!(writer, "<td class=\"num\">{}</td>", (column.value)(user))?;
        }
        writeln!(writer, "</tr>")?;
    }

    writeln!(writer, "    </tbody>")?;
    writeln!(writer, "  </table>")?;
    Ok(())
}

fn write_graphs<W: Write>(writer: &mut W, users: &[&UserStatistics]) -> Result<()> {
    writeln!(writer, "  <h2>Contribution graphs</h2>")?;
    for user in users {
        let username = html_escape(&user.username);
        writeln!(writer, "  <div class=\"graph\">")?;
        writeln!(writer, "    <h3>{username}</h3>")?;
        writeln!(
            writer,
            "    <img src=\"{}\" alt=\"Contribution graph for {username}\" loading=\"lazy\">",
            html_escape(&user.contribution_graph_url)
        )?;
        writeln!(writer, "  </div>")?;
    }
    Ok(())
}

fn write_failures<W: Write>(writer: &mut W, failures: &[FetchFailure]) -> Result<()> {
    writeln!(writer, "  <div class=\"failures\">")?;
    writeln!(writer, "    <h2>Could not add {} user(s)</h2>", failures.len())?;
    writeln!(writer, "    <ul>")?;
    for failure in failures {
        writeln!(
            writer,
            "      <li><strong>{}</strong>: {}</li>",
            html_escape(&failure.username),
            html_escape(&failure.message())
        )?;
    }
    writeln!(writer, "    </ul>")?;
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::reports::common::test_users;
    use crate::stats::FetchError;
    use chrono::TimeZone;

    fn test_timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape("<>&\"'"), "&lt;&gt;&amp;&quot;&#39;");
        assert_eq!(html_escape(""), "");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTimeZoneInformationForYear")]
    fn test_generate_embeds_graphs() {
        let users = test_users();
        let refs: Vec<&UserStatistics> = users.iter().collect();
        let mut output = String::new();

        generate(&refs, &[], test_timestamp(), &mut output).unwrap();

        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.trim_end().ends_with("</html>"));
        assert!(output.contains("<img src=\"https://ghchart.rshah.org/octocat\""));
        assert!(output.contains("<a href=\"https://github.com/hubot\">hubot</a>"));
        assert!(output.contains("(estimated)"));
        assert!(output.contains("on 2024-01-15 10:30"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTimeZoneInformationForYear")]
    fn test_generate_empty_with_failures() {
        let failures = vec![FetchFailure::new("<bad>", FetchError::NotFound)];
        let mut output = String::new();

        generate(&[], &failures, test_timestamp(), &mut output).unwrap();

        assert!(output.contains("No users on the leaderboard."));
        assert!(output.contains("<li><strong>&lt;bad&gt;</strong>: user not found</li>"));
        assert!(!output.contains("Contribution graphs"));
    }
}

use crate::Result;
use crate::stats::{FetchFailure, UserStatistics};
use core::fmt::Write;
use serde_json::json;

pub fn generate<W: Write>(users: &[&UserStatistics], failures: &[FetchFailure], writer: &mut W) -> Result<()> {
    let failures: Vec<_> = failures
        .iter()
        .map(|f| {
            json!({
                "username": f.username,
                "error": f.message(),
            })
        })
        .collect();

    let output = json!({
        "users": users,
        "failures": failures,
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::reports::common::test_users;
    use crate::stats::FetchError;

    #[test]
    fn test_generate() {
        let users = test_users();
        let refs: Vec<&UserStatistics> = users.iter().collect();
        let failures = vec![FetchFailure::new("bad", FetchError::NotFound)];
        let mut output = String::new();

        generate(&refs, &failures, &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["users"].as_array().unwrap().len(), 2);
        assert_eq!(value["users"][0]["username"], "octocat");
        assert_eq!(value["users"][0]["commit_count"], 1200);
        assert_eq!(value["users"][1]["strategy"], "sampled");
        assert_eq!(value["failures"][0]["username"], "bad");
        assert_eq!(value["failures"][0]["error"], "user not found");
    }

    #[test]
    fn test_generate_empty() {
        let mut output = String::new();
        generate(&[], &[], &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value, json!({ "users": [], "failures": [] }));
    }
}

use regex::Regex;
use std::sync::LazyLock;

/// Longest handle GitHub allows.
pub const MAX_HANDLE_LEN: usize = 39;

static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*$").expect("invalid regex"));

/// Whether `handle` follows GitHub's username grammar.
///
/// Alphanumeric segments joined by single hyphens, at most 39 characters, with no
/// leading or trailing hyphen.
#[must_use]
pub fn is_valid_handle(handle: &str) -> bool {
    handle.len() <= MAX_HANDLE_LEN && HANDLE_RE.is_match(handle)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_handles() {
        for handle in ["alice", "Bob", "octo-cat", "a", "x1-y2-z3", "123"] {
            assert!(is_valid_handle(handle), "{handle} should be valid");
        }
    }

    #[test]
    fn rejects_bad_hyphenation() {
        for handle in ["-alice", "alice-", "al--ice", "-"] {
            assert!(!is_valid_handle(handle), "{handle} should be invalid");
        }
    }

    #[test]
    fn rejects_foreign_characters() {
        for handle in ["123invalid_", "a b", "al.ice", "ålice", "", "alice\n"] {
            assert!(!is_valid_handle(handle), "{handle:?} should be invalid");
        }
    }

    #[test]
    fn enforces_length_limit() {
        let longest = "a".repeat(MAX_HANDLE_LEN);
        assert!(is_valid_handle(&longest));
        assert!(!is_valid_handle(&format!("{longest}a")));
    }
}

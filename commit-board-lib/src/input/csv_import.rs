use crate::Result;
use crate::stats::is_valid_handle;
use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecord, Trim};
use ohno::{EnrichableExt, IntoAppError};
use std::fs::File;
use std::io::Read;

const LOG_TARGET: &str = "     input";
const HEADER_NAME: &str = "username";

/// Usernames extracted from a delimited file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImport {
    /// Valid handles in file order.
    pub usernames: Vec<String>,
    /// Rows whose value failed handle validation.
    pub invalid_rows: usize,
}

impl CsvImport {
    /// Warning to show when rows were rejected.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        (self.invalid_rows > 0).then(|| format!("{} rows contain invalid GitHub usernames and were skipped", self.invalid_rows))
    }
}

/// Read usernames from the CSV file at `path`.
pub fn read_usernames(path: &Utf8Path) -> Result<CsvImport> {
    let file = File::open(path).into_app_err_with(|| format!("unable to open CSV file '{path}'"))?;
    parse_usernames(file).map_err(|e| e.enrich_with(|| format!("unable to read usernames from '{path}'")))
}

/// Extract usernames from CSV data.
///
/// If any cell of the first row is `username` (ignoring case and surrounding
/// whitespace) that row is a header and its column is read. Otherwise every row
/// is data and the first column is read. Empty cells are skipped silently.
pub fn parse_usernames(reader: impl Read) -> Result<CsvImport> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut import = CsvImport::default();
    let mut column = 0;
    let mut record = StringRecord::new();
    let mut row = 0usize;

    while csv_reader
        .read_record(&mut record)
        .into_app_err_with(|| format!("malformed CSV near row {}", row + 1))?
    {
        row += 1;

        if row == 1
            && let Some(index) = record.iter().position(|cell| cell.eq_ignore_ascii_case(HEADER_NAME))
        {
            log::debug!(target: LOG_TARGET, "Found '{HEADER_NAME}' header in column {}", index + 1);
            column = index;
            continue;
        }

        let Some(value) = record.get(column).filter(|v| !v.is_empty()) else {
            continue;
        };

        if is_valid_handle(value) {
            import.usernames.push(value.to_string());
        } else {
            log::debug!(target: LOG_TARGET, "Skipping row {row}: '{value}' is not a valid GitHub username");
            import.invalid_rows += 1;
        }
    }

    log::info!(
        target: LOG_TARGET,
        "Imported {} username(s), {} invalid row(s)",
        import.usernames.len(),
        import.invalid_rows
    );

    Ok(import)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(data: &str) -> CsvImport {
        parse_usernames(data.as_bytes()).unwrap()
    }

    #[test]
    fn header_row_with_invalid_entry() {
        let import = parse("username\nbob\n123invalid_\ncarol\n");

        assert_eq!(import.usernames, vec!["bob", "carol"]);
        assert_eq!(import.invalid_rows, 1);
        assert_eq!(
            import.warning().as_deref(),
            Some("1 rows contain invalid GitHub usernames and were skipped")
        );
    }

    #[test]
    fn headerless_file_uses_first_column() {
        let import = parse("alice,42\nbob,7\n");

        assert_eq!(import.usernames, vec!["alice", "bob"]);
        assert!(import.warning().is_none());
    }

    #[test]
    fn header_selects_its_column() {
        let import = parse("name, UserName ,team\nAlice A,alice,red\nBob B,bob,blue\n");

        assert_eq!(import.usernames, vec!["alice", "bob"]);
        assert_eq!(import.invalid_rows, 0);
    }

    #[test]
    fn empty_cells_are_skipped_silently() {
        let import = parse("username\n\nbob\n   \ncarol\n");

        assert_eq!(import.usernames, vec!["bob", "carol"]);
        assert_eq!(import.invalid_rows, 0);
    }

    #[test]
    fn short_rows_are_skipped() {
        let import = parse("id,username\n1,alice\n2\n3,bob\n");

        assert_eq!(import.usernames, vec!["alice", "bob"]);
        assert_eq!(import.invalid_rows, 0);
    }

    #[test]
    fn values_are_trimmed() {
        let import = parse("  alice  \n\tbob\n");

        assert_eq!(import.usernames, vec!["alice", "bob"]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse(""), CsvImport::default());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username").unwrap();
        writeln!(file, "octocat").unwrap();
        writeln!(file, "-nope").unwrap();
        file.flush().unwrap();

        let path = Utf8Path::from_path(file.path()).unwrap();
        let import = read_usernames(path).unwrap();

        assert_eq!(import.usernames, vec!["octocat"]);
        assert_eq!(import.invalid_rows, 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let _ = read_usernames(Utf8Path::new("/definitely/not/here.csv")).unwrap_err();
    }
}

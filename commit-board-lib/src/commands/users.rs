use super::Host;
use super::common::{Common, CommonArgs};
use crate::Result;
use crate::board::{AddMode, AddOutcome, SortKey, SortOrder, summary_notice};
use crate::input::read_usernames;
use camino::Utf8PathBuf;
use clap::Parser;

const LOG_TARGET: &str = "     users";

#[derive(Parser, Debug)]
pub struct UsersArgs {
    /// GitHub usernames to add to the leaderboard
    #[arg(value_name = "USERNAME")]
    pub usernames: Vec<String>,

    /// Read usernames from a CSV file, either from a `username` column or from the first column
    #[arg(long, value_name = "PATH")]
    pub from_csv: Option<Utf8PathBuf>,

    /// Aggregate users concurrently in batches instead of one at a time (implied by --from-csv)
    #[arg(long)]
    pub batched: bool,

    /// Give users that failed one more attempt before reporting
    #[arg(long)]
    pub retry_failed: bool,

    /// Leaderboard column to sort by
    #[arg(long, value_name = "KEY", default_value = "commits")]
    pub sort: SortKey,

    /// Sort in ascending instead of descending order
    #[arg(long)]
    pub ascending: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl UsersArgs {
    const fn mode(&self) -> AddMode {
        if self.batched || self.from_csv.is_some() {
            AddMode::Batched
        } else {
            AddMode::Sequential
        }
    }

    const fn order(&self) -> SortOrder {
        if self.ascending { SortOrder::Ascending } else { SortOrder::Descending }
    }
}

pub async fn process_users<H: Host>(host: &mut H, args: &UsersArgs) -> Result<()> {
    let mut common = Common::new(host, &args.common)?;

    let mut usernames = args.usernames.clone();
    if let Some(path) = &args.from_csv {
        let import = read_usernames(path)?;
        log::info!(target: LOG_TARGET, "Read {} username(s) from '{path}'", import.usernames.len());
        if let Some(warning) = import.warning() {
            common.warn(&warning);
        }
        usernames.extend(import.usernames);
    }

    let mode = args.mode();
    let mut board = common.leaderboard();
    let mut outcome = board.add_users(&usernames, mode).await;

    if args.retry_failed && !board.failures().is_empty() {
        log::info!(target: LOG_TARGET, "Retrying {} failed user(s)", board.failures().len());
        let retried = board.retry_failed(mode).await;
        outcome = merge_retry(outcome, retried);
    }

    common.report(&board.sorted(args.sort, args.order()), board.failures())?;
    common.notify(&summary_notice(&outcome));

    if outcome.success == 0 && outcome.errors > 0 {
        common.exit(1);
    }

    Ok(())
}

/// Fold a retry round into the first round's tally.
///
/// Users that recovered move from `errors` to `success`; whatever still fails stays counted once.
const fn merge_retry(first: AddOutcome, retried: AddOutcome) -> AddOutcome {
    AddOutcome {
        success: first.success + retried.success,
        errors: retried.errors,
        skipped: first.skipped,
    }
}

//! Command dispatch logic for commit-board

use super::{InitArgs, RateLimitArgs, UsersArgs, init_config, process_users, show_rate_limit};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "commit-board", version, author, long_about = None)]
#[command(about = "Rank GitHub users by their recent commit activity")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: BoardSubcommand,
}

#[derive(Subcommand, Debug)]
enum BoardSubcommand {
    /// Aggregate commit statistics for GitHub users and produce a leaderboard
    Users(Box<UsersArgs>),
    /// Show the remaining GitHub API quota
    RateLimit(RateLimitArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        BoardSubcommand::Users(users_args) => process_users(host, users_args).await,
        BoardSubcommand::RateLimit(rate_limit_args) => show_rate_limit(host, rate_limit_args).await,
        BoardSubcommand::Init(init_args) => init_config(host, init_args),
    }
}

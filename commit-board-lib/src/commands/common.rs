//! Common processing logic shared between commands.

use super::ProgressReporter;
use super::config::Config;
use crate::Result;
use crate::board::{Leaderboard, Notice, NoticeLevel};
use crate::fetch::{BatchExecutor, Cache, Clock, RetryExecutor, TokioClock};
use crate::github::Client;
use crate::reports::{generate_console, generate_csv, generate_html, generate_json};
use crate::stats::{Aggregator, FetchFailure, UserStatistics};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use clap::{Args, ValueEnum};
use ohno::IntoAppError;
use owo_colors::OwoColorize;
use std::fs;
use std::io::{IsTerminal, Write, stderr, stdout};
use std::sync::Arc;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    fn enabled(self, is_terminal: impl FnOnce() -> bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments needed to talk to GitHub
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to configuration file (default is `commit-board.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

/// Common arguments for commands that produce a leaderboard
#[derive(Args, Debug)]
pub struct CommonArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Output the leaderboard to an HTML file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub html: Option<Utf8PathBuf>,

    /// Output the leaderboard to a CSV file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub csv: Option<Utf8PathBuf>,

    /// Output the leaderboard to a JSON file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Output the leaderboard to the console. If omitted, console output is shown only when no other reports are generated.
    #[arg(long, help_heading = "Report Output")]
    pub console: bool,
}

/// Everything needed to reach GitHub: configuration plus a ready client.
#[derive(Debug)]
pub struct Connection {
    pub config: Config,
    pub client: Client,
    pub clock: Arc<dyn Clock>,
}

impl Connection {
    /// Initialize logging, load configuration, and build the API client.
    pub fn open(args: &ConnectionArgs) -> Result<Self> {
        init_logging(args.log_level);

        let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let client = Client::new(args.github_token.as_deref(), &config.github.api_url, Arc::clone(&clock))?;

        Ok(Self { config, client, clock })
    }
}

pub struct Common<'a, H: super::Host> {
    pub config: Config,
    host: &'a mut H,
    clock: Arc<dyn Clock>,
    client: Client,
    progress: ProgressReporter,
    authenticated: bool,
    color: ColorMode,
    console: bool,
    html: Option<Utf8PathBuf>,
    csv: Option<Utf8PathBuf>,
    json: Option<Utf8PathBuf>,
}

impl<'a, H: super::Host> Common<'a, H> {
    /// Create a new Common processor with logger, client, and config
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or the client cannot be built
    pub fn new(host: &'a mut H, args: &CommonArgs) -> Result<Self> {
        let Connection { config, client, clock } = Connection::open(&args.connection)?;

        // Log lines and the bar would fight over stderr
        let show_progress = args.connection.log_level == LogLevel::None && stderr().is_terminal();
        let progress = ProgressReporter::new(show_progress, args.color.enabled(|| stderr().is_terminal()));

        Ok(Self {
            config,
            host,
            clock,
            client,
            progress,
            authenticated: args.connection.github_token.is_some(),
            color: args.color,
            console: args.console,
            html: args.html.clone(),
            csv: args.csv.clone(),
            json: args.json.clone(),
        })
    }

    /// Assemble the request pipeline and an empty leaderboard on top of it.
    pub fn leaderboard(&mut self) -> Leaderboard<Aggregator> {
        if !self.authenticated {
            let _ = writeln!(
                self.host.error(),
                "No GitHub token given; unauthenticated requests are limited to 60 per hour"
            );
        }

        let cache = Cache::new(Arc::clone(&self.clock));
        let retry = RetryExecutor::new(cache, Arc::clone(&self.clock), self.config.retry_policy());
        let batcher = BatchExecutor::new(retry.clone(), Arc::clone(&self.clock), self.config.batch.batch_pause);
        let aggregator = Aggregator::new(
            self.client.clone(),
            retry,
            Arc::clone(&self.clock),
            self.config.aggregator_settings(),
        );

        Leaderboard::new(aggregator, batcher, Arc::clone(&self.clock))
            .with_progress(Arc::new(self.progress.clone()))
            .with_batch_size(self.config.batch.batch_size)
            .with_request_pause(self.config.batch.request_pause)
    }

    /// Print a line to stderr, colored by its level
    pub fn notify(&mut self, notice: &Notice) {
        if self.color.enabled(|| stderr().is_terminal()) {
            let message = &notice.message;
            let _ = match notice.level {
                NoticeLevel::Info => writeln!(self.host.error(), "{}", message.cyan()),
                NoticeLevel::Success => writeln!(self.host.error(), "{}", message.green()),
                NoticeLevel::Warning => writeln!(self.host.error(), "{}", message.yellow()),
                NoticeLevel::Error => writeln!(self.host.error(), "{}", message.red().bold()),
            };
        } else {
            let _ = writeln!(self.host.error(), "{notice}");
        }
    }

    pub fn warn(&mut self, message: &str) {
        self.notify(&Notice {
            level: NoticeLevel::Warning,
            message: message.to_string(),
        });
    }

    pub fn report(&mut self, users: &[&UserStatistics], failures: &[FetchFailure]) -> Result<()> {
        let generating_reports = self.html.is_some() || self.csv.is_some() || self.json.is_some();

        if self.console || !generating_reports {
            let mut console_output = String::new();
            let use_colors = self.color.enabled(|| stdout().is_terminal());
            generate_console(users, failures, use_colors, &mut console_output)?;
            let _ = write!(self.host.output(), "{console_output}");
        }

        if let Some(filename) = &self.html {
            let mut html = String::new();
            generate_html(users, failures, Local::now(), &mut html)?;
            fs::write(filename, html).into_app_err_with(|| format!("writing HTML report to '{filename}'"))?;
        }

        if let Some(filename) = &self.csv {
            let mut csv_output = String::new();
            generate_csv(users, &mut csv_output)?;
            fs::write(filename, csv_output).into_app_err_with(|| format!("writing CSV report to '{filename}'"))?;
        }

        if let Some(filename) = &self.json {
            let mut json_output = String::new();
            generate_json(users, failures, &mut json_output)?;
            fs::write(filename, json_output).into_app_err_with(|| format!("writing JSON report to '{filename}'"))?;
        }

        Ok(())
    }

    pub fn exit(&mut self, code: i32) {
        self.host.exit(code);
    }
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

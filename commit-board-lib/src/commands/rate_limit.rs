use super::Host;
use super::common::{Connection, ConnectionArgs};
use crate::Result;
use crate::github::{RateLimitStatus, RateLimitWindow};
use chrono::{DateTime, Utc};
use clap::Parser;
use core::fmt;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct RateLimitArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn show_rate_limit<H: Host>(host: &mut H, args: &RateLimitArgs) -> Result<()> {
    let connection = Connection::open(&args.connection)?;
    let status = connection
        .client
        .rate_limit()
        .await
        .into_app_err("querying the GitHub rate limit")?;

    let mut output = String::new();
    write_status(&status, connection.clock.now(), &mut output)?;
    let _ = write!(host.output(), "{output}");
    Ok(())
}

fn write_status<W: fmt::Write>(status: &RateLimitStatus, now: DateTime<Utc>, writer: &mut W) -> Result<()> {
    write_window("core", &status.resources.core, now, writer)?;
    if let Some(search) = &status.resources.search {
        write_window("search", search, now, writer)?;
    }
    Ok(())
}

fn write_window<W: fmt::Write>(name: &str, window: &RateLimitWindow, now: DateTime<Utc>, writer: &mut W) -> Result<()> {
    write!(writer, "{name:<8}{}/{} requests remaining", window.remaining, window.limit)?;

    if let Some(reset_at) = window.reset_at() {
        let minutes = (reset_at - now).num_minutes().max(0);
        write!(writer, ", resets at {} (in {minutes} min)", reset_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }

    writeln!(writer)?;
    Ok(())
}

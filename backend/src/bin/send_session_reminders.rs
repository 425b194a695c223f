//! Send reminder notifications for confirmed sessions that start soon.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;

use clap::Parser;
use mentorship::domain::send_reminders;
use mentorship::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselNotificationRepository, DieselUserRepository,
    PoolConfig,
};
use mockable::{Clock, DefaultClock};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `send-session-reminders` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "send-session-reminders",
    about = "Notify both parties of confirmed sessions starting soon",
    version
)]
struct CliArgs {
    /// Minutes ahead of now to look for session starts.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..))]
    minutes: i64,
    /// Count due sessions without writing notifications.
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url, env::var("DATABASE_URL").ok())?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let bookings = DieselBookingRepository::new(pool.clone());
    let notifications = DieselNotificationRepository::new(pool.clone());
    let users = DieselUserRepository::new(pool);

    let run = send_reminders(
        &bookings,
        &notifications,
        &users,
        DefaultClock.utc(),
        args.minutes,
        args.dry_run,
    )
    .await
    .map_err(|error| io::Error::other(format!("send reminders: {error}")))?;
    info!(due = run.due, sent = run.sent, skipped = run.skipped, "reminder run finished");

    print_summary(&summary_line(run.due, run.sent, run.skipped, args.dry_run));
    Ok(())
}

#[expect(clippy::print_stdout, reason = "the summary is the program's output")]
fn print_summary(line: &str) {
    println!("{line}");
}

fn summary_line(due: usize, sent: usize, skipped: usize, dry_run: bool) -> String {
    let mode = if dry_run { " (dry run)" } else { "" };
    format!("due={due} sent={sent} skipped={skipped}{mode}")
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    match from_env {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        )),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DATABASE_URL",
        )),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_look_thirty_minutes_ahead() {
        let args = CliArgs::try_parse_from(["send-session-reminders"]).expect("defaults parse");
        assert_eq!(args.minutes, 30);
        assert!(!args.dry_run);
        assert!(args.database_url.is_none());
    }

    #[rstest]
    fn flags_are_parsed() {
        let args = CliArgs::try_parse_from([
            "send-session-reminders",
            "--minutes",
            "60",
            "--dry-run",
            "--database-url",
            "postgres://localhost/mentorship",
        ])
        .expect("flags parse");
        assert_eq!(args.minutes, 60);
        assert!(args.dry_run);
        assert_eq!(
            args.database_url.as_deref(),
            Some("postgres://localhost/mentorship")
        );
    }

    #[rstest]
    fn non_positive_minutes_are_rejected() {
        assert!(CliArgs::try_parse_from(["send-session-reminders", "--minutes", "0"]).is_err());
    }

    #[rstest]
    #[case::explicit(Some("postgres://a"), Some("postgres://b"), Some("postgres://a"))]
    #[case::env_fallback(None, Some("postgres://b"), Some("postgres://b"))]
    #[case::blank_explicit(Some("  "), Some("postgres://b"), None)]
    #[case::blank_env(None, Some(""), None)]
    #[case::missing(None, None, None)]
    fn database_url_resolution(
        #[case] explicit: Option<&str>,
        #[case] from_env: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let resolved = resolve_database_url(
            explicit.map(str::to_owned),
            from_env.map(str::to_owned),
        );
        assert_eq!(resolved.ok().as_deref(), expected);
    }

    #[rstest]
    #[case(false, "due=3 sent=2 skipped=1")]
    #[case(true, "due=3 sent=2 skipped=1 (dry run)")]
    fn summary_reports_the_tally(#[case] dry_run: bool, #[case] expected: &str) {
        assert_eq!(summary_line(3, 2, 1, dry_run), expected);
    }
}

pub mod connect;
pub mod top_rows;
pub mod usage_buckets;
pub mod usage_counts;

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use std::time::Instant;
use tracing::info;

use crate::config::{ConnectionConfig, ExportConfig};
use crate::models::UsageRecord;

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the warehouse accepts a connection and report its version
    TestConnect,
    /// Export the most recent rows of the table, newest first
    TopRows {
        #[arg(long, help = "Number of rows to export (defaults to top_n from config)")]
        limit: Option<u32>,
    },
    /// Export per-identifier usage counts
    UsageCounts,
    /// Export usage counts together with their bucket summary
    UsageBuckets {
        #[arg(
            long,
            value_enum,
            default_value_t = InvalidPolicy::Abort,
            help = "What to do with records whose usage count is below 2"
        )]
        on_invalid: InvalidPolicy,
    },
}

/// Handling of usage records that fall outside the bucket domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InvalidPolicy {
    /// Fail the run before anything is written
    #[default]
    Abort,
    /// Leave the record out of the summary and log a warning
    Skip,
}

pub async fn handle_command(command: Commands, export: &ExportConfig) -> Result<()> {
    let started = Instant::now();
    info!("Script started");

    let result = run_command(command, export).await;
    finish(started, result)
}

async fn run_command(command: Commands, export: &ExportConfig) -> Result<()> {
    info!("Loading environment variables");
    let connection = ConnectionConfig::from_env().context("Failed to load connection settings")?;
    info!("Environment variables loaded");

    match command {
        Commands::TestConnect => {
            connect::run(&connection).await?;
        }
        Commands::TopRows { limit } => {
            top_rows::run(&connection, export, limit.unwrap_or(export.top_n)).await?;
        }
        Commands::UsageCounts => {
            usage_counts::run(&connection, export).await?;
        }
        Commands::UsageBuckets { on_invalid } => {
            usage_buckets::run(&connection, export, on_invalid).await?;
        }
    }
    Ok(())
}

/// Log the run time whether the command succeeded or not, then pass the result on
fn finish<T>(started: Instant, result: Result<T>) -> Result<T> {
    info!(
        elapsed = %elapsed(started),
        success = result.is_ok(),
        "Script completed"
    );
    result
}

/// Seconds since `start`, two decimals
pub(crate) fn elapsed(start: Instant) -> String {
    format!("{:.2}s", start.elapsed().as_secs_f64())
}

/// Log the first `limit` records, labelled with the usage header
pub(crate) fn log_sample(records: &[UsageRecord], header: [&str; 2], limit: usize) {
    let [identifier, usage] = header;
    for (i, record) in records.iter().take(limit).enumerate() {
        info!(
            "  Row {}: {}: {}, {}: {}",
            i + 1,
            identifier,
            record.identifier,
            usage,
            record.count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged<T>(run: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let out = tracing::subscriber::with_default(subscriber, run);
        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        (out, text)
    }

    #[test]
    fn test_failed_run_still_logs_completion() {
        let (result, text) = logged(|| {
            finish::<()>(Instant::now(), Err(anyhow::anyhow!("login refused")))
        });

        assert_eq!(result.unwrap_err().to_string(), "login refused");
        assert!(text.contains("Script completed"), "{}", text);
        assert!(text.contains("success=false"), "{}", text);
        assert!(text.contains("elapsed="), "{}", text);
    }

    #[test]
    fn test_successful_run_logs_completion() {
        let (result, text) = logged(|| finish(Instant::now(), Ok(7)));

        assert_eq!(result.unwrap(), 7);
        assert!(text.contains("success=true"), "{}", text);
    }
}

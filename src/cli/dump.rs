//! Dump and check command implementations.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::CliError;
use crate::cache::DayCache;
use crate::config;
use crate::dumper::Dumper;
use crate::fetcher::client::ApiClient;
use crate::fetcher::http::{HttpTransport, Session};
use crate::fetcher::throttle::RequestThrottler;
use crate::output::{CsvExporter, Exporter, OutputResult};
use crate::shutdown::SharedShutdown;
use crate::{today_in_reference_tz, CoinMode, DayResult, Source};

/// Environment variable consulted when `--cookie-file` is not given.
const COOKIE_ENV: &str = "BILI_COOKIE";

/// Dump a streamer's received-gift revenue history.
#[derive(Debug, Parser)]
#[command(name = "bili-revenue-dump", version, about)]
pub struct Cli {
    /// File holding the account's browser cookie string
    /// (falls back to the BILI_COOKIE environment variable).
    #[arg(long, global = true)]
    pub cookie_file: Option<PathBuf>,

    /// Root directory for raw JSON and CSV tables.
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Minimum seconds between API requests.
    #[arg(long, global = true, default_value_t = config::SLEEP_INTERVAL.as_secs_f64())]
    pub sleep: f64,

    /// Total attempts per API call (first try included).
    #[arg(long, global = true, default_value_t = config::MAX_RETRIES)]
    pub max_retries: u32,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dump a backward range of days to raw JSON and CSV.
    Dump(DumpArgs),
    /// Verify that the session cookie still works.
    Check(CheckArgs),
}

/// Arguments for the dump command
#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Start date (YYYY-MM-DD); defaults to today in the platform's
    /// timezone (UTC+8).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Number of days to dump, walking backward from the start date.
    #[arg(long, default_value_t = 1)]
    pub days: u32,

    /// Include free-tier gifts instead of paid-only.
    #[arg(long)]
    pub include_free: bool,
}

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {}

/// Resolve the cookie string from `--cookie-file` or the environment.
fn load_cookie(cli: &Cli) -> Result<String, CliError> {
    if let Some(path) = &cli.cookie_file {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CliError::InvalidArgument(format!("failed to read {}: {e}", path.display()))
        })?;
        return Ok(raw.trim().to_string());
    }
    std::env::var(COOKIE_ENV).map_err(|_| {
        CliError::InvalidArgument(format!(
            "no cookie given: pass --cookie-file or set {COOKIE_ENV}"
        ))
    })
}

/// Validate `--sleep` and turn it into a throttle interval.
fn sleep_interval(sleep: f64) -> Result<Duration, CliError> {
    Duration::try_from_secs_f64(sleep)
        .map_err(|_| CliError::InvalidArgument("--sleep must be a finite number >= 0".into()))
}

/// Build the authenticated client + dumper stack from global options.
fn build_dumper(
    cli: &Cli,
    shutdown: SharedShutdown,
) -> Result<(Dumper<HttpTransport>, u64), CliError> {
    let interval = sleep_interval(cli.sleep)?;
    let session = Session::from_cookie_str(&load_cookie(cli)?)?;
    let transport = HttpTransport::new(&session)?;
    let throttler = RequestThrottler::new(interval);
    let client = ApiClient::new(transport, throttler, cli.max_retries);
    let cache = DayCache::new(cli.data_dir.clone());
    let dumper = Dumper::new(client, cache, session.uid()).with_shutdown(shutdown);
    Ok((dumper, session.uid()))
}

/// Exporter wrapper that ticks a progress bar per completed day.
struct ProgressExporter<E: Exporter> {
    inner: E,
    bar: ProgressBar,
}

impl<E: Exporter> Exporter for ProgressExporter<E> {
    fn export_day(&mut self, result: &DayResult) -> OutputResult<()> {
        self.inner.export_day(result)?;
        self.bar.inc(1);
        Ok(())
    }
}

impl DumpArgs {
    /// Execute the dump command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let (dumper, uid) = build_dumper(cli, shutdown)?;
        let start = self.date.unwrap_or_else(today_in_reference_tz);
        let mode = if self.include_free {
            CoinMode::IncludeFree
        } else {
            CoinMode::PaidOnly
        };
        info!(uid, %start, days = self.days, %mode, "starting range dump");

        let bar = ProgressBar::new(u64::from(self.days));
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} days {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let mut exporter = ProgressExporter {
            inner: CsvExporter::new(cli.data_dir.clone()),
            bar: bar.clone(),
        };

        let results = dumper.dump_range(start, self.days, mode, &mut exporter).await?;
        bar.finish_and_clear();

        let from_cache = results.iter().filter(|r| r.source == Source::Cache).count();
        let total_entries: usize = results.iter().map(|r| r.entries.len()).sum();
        println!(
            "dumped {} days ({} from cache), {} entries total",
            results.len(),
            from_cache,
            total_entries
        );
        Ok(())
    }
}

impl CheckArgs {
    /// Execute the check command.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let (dumper, uid) = build_dumper(cli, shutdown)?;
        dumper.client().gift_types().await?;
        println!("session for uid {uid} is valid");
        Ok(())
    }
}

//! Command-line interface for reading rows.

use bigtable_rows::proto::RowRange;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::time::Duration;

/// Read rows from a Bigtable table or emulator.
#[derive(Debug, Parser)]
#[command(version, propagate_version = true)]
pub(crate) struct Args {
    /// The table to read from.
    #[command(flatten)]
    pub(crate) table: TableArgs,
    /// How broken streams are resumed.
    #[command(flatten)]
    pub(crate) retry: RetryArgs,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// What operation to perform.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Stream the rows matching the given keys and ranges.
    ///
    /// Without any key or range, the whole table is read.
    #[clap(alias = "scan")]
    Read {
        /// A row key to read. May be repeated.
        #[arg(long = "key")]
        keys: Vec<String>,
        /// A key range to read, written `START..END`. `START` is inclusive and `END` exclusive;
        /// either may be omitted. May be repeated.
        #[arg(long = "range", value_parser = parse_range)]
        ranges: Vec<RowRange>,
        /// The maximum number of rows to read.
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Read a single row.
    #[clap(alias = "fetch")]
    Get {
        /// The key of the row.
        key: String,
    },
}

/// Where the table lives.
#[derive(Debug, ClapArgs)]
pub(crate) struct TableArgs {
    /// The endpoint to connect to. A bare `host:port` is treated as a plaintext emulator.
    #[arg(long, env = "BIGTABLE_EMULATOR_HOST", default_value = "localhost:8086")]
    pub(crate) endpoint: String,
    /// The project owning the instance.
    #[arg(long, env = "BIGTABLE_PROJECT")]
    pub(crate) project: String,
    /// The instance owning the table.
    #[arg(long, env = "BIGTABLE_INSTANCE")]
    pub(crate) instance: String,
    /// The table to read.
    #[arg(long)]
    pub(crate) table: String,
    /// The app profile to route reads through.
    #[arg(long)]
    pub(crate) app_profile: Option<String>,
}

impl TableArgs {
    /// The endpoint as a URI, adding a plaintext scheme to a bare `host:port`.
    pub(crate) fn endpoint_uri(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

/// Retry settings.
#[derive(Debug, ClapArgs)]
pub(crate) struct RetryArgs {
    /// How many times a broken stream is resumed before giving up.
    #[arg(long, default_value_t = bigtable_rows::retry::DEFAULT_READ_RETRY_COUNT)]
    pub(crate) max_retries: u32,
    /// The delay before the first resumption, in milliseconds.
    #[arg(long, default_value_t = 10)]
    pub(crate) initial_backoff_ms: u64,
    /// The longest delay between resumptions, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub(crate) max_backoff_ms: u64,
}

impl RetryArgs {
    /// The policy described by these arguments.
    pub(crate) fn policy(&self) -> bigtable_rows::RetryPolicy {
        bigtable_rows::RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms))
            .with_max_backoff(Duration::from_millis(self.max_backoff_ms))
    }
}

/// Parse `START..END` into a range that includes `START` and excludes `END`. An empty side is
/// unbounded.
fn parse_range(range: &str) -> Result<RowRange, String> {
    let Some((start, end)) = range.split_once("..") else {
        return Err(format!("expected `START..END`, got `{range}`"));
    };
    Ok(RowRange::closed_open(start, end))
}

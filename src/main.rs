//! A command-line client that reads rows from Bigtable or its emulator.
//!
//! For usage, run `cargo run --features binary -- --help`.

mod cli;

use crate::cli::{Args, Command};
use bigtable_rows::proto::RowSet;
use bigtable_rows::{table_path, GrpcTransport, Row, Table};
use clap::Parser as _;
use futures::StreamExt as _;
use std::process::ExitCode;
use tokio::io::{self, AsyncWriteExt as _};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(args))
}

/// Connect to the table and perform the requested operation.
///
/// # stdout
///
/// Every cell of every row read is written on its own line as `key family:qualifier @timestamp
/// value`. Keys, qualifiers and values are written lossily as UTF-8.
async fn run(
    Args {
        table: table_args,
        retry,
        command,
    }: Args,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let transport = GrpcTransport::connect(table_args.endpoint_uri()).await?;
    let mut table = Table::new(
        transport,
        table_path(&table_args.project, &table_args.instance, &table_args.table),
    )
    .with_retry_policy(retry.policy());
    if let Some(app_profile) = table_args.app_profile {
        table = table.with_app_profile(app_profile);
    }

    let mut stdout = io::stdout();
    match command {
        Command::Read {
            keys,
            ranges,
            limit,
        } => {
            let rows = RowSet {
                row_keys: keys.into_iter().map(String::into_bytes).collect(),
                row_ranges: ranges,
            };
            let mut rows = std::pin::pin!(table.read_rows(rows, None, limit));
            while let Some(row) = rows.next().await {
                write_row(&mut stdout, &row?).await?;
            }
        }
        Command::Get { key } => match table.read_row(key, None).await? {
            Some(row) => write_row(&mut stdout, &row).await?,
            None => return Ok(ExitCode::FAILURE),
        },
    }
    stdout.flush().await?;

    Ok(ExitCode::SUCCESS)
}

/// Write one line per cell of `row`.
async fn write_row(stdout: &mut io::Stdout, row: &Row) -> io::Result<()> {
    let key = String::from_utf8_lossy(row.key());
    for cell in row.iter_cells() {
        let line = format!(
            "{key} {}:{} @{} {}\n",
            cell.family(),
            String::from_utf8_lossy(cell.qualifier()),
            cell.timestamp_micros(),
            String::from_utf8_lossy(cell.value()),
        );
        stdout.write_all(line.as_bytes()).await?;
    }
    Ok(())
}

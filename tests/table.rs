mod helpers;

use crate::helpers::{drain, response, row_chunk, Attempt, ScriptedTransport};
use anyhow::Result;
use bigtable_rows::proto::row_filter::Filter;
use bigtable_rows::proto::{ReadRowsRequest, RowFilter, RowRange, RowSet};
use bigtable_rows::{table_path, RetryPolicy, Table};
use std::time::Duration;
use tonic::Status;

fn latest_only() -> RowFilter {
    RowFilter {
        filter: Some(Filter::CellsPerColumnLimitFilter(1)),
    }
}

#[tokio::test]
async fn read_rows_builds_request() -> Result<()> {
    let transport = ScriptedTransport::new([Attempt::Respond(vec![response([
        row_chunk("a", "1"),
        row_chunk("b", "2"),
    ])])]);
    let table = Table::new(transport.clone(), table_path("p", "i", "t")).with_app_profile("batch");

    let rows = RowSet {
        row_keys: Vec::new(),
        row_ranges: vec![RowRange::closed_open("a", "c")],
    };
    let (keys, err) = drain(table.read_rows(rows.clone(), Some(latest_only()), Some(10))).await;
    assert!(err.is_none());
    assert_eq!(keys, ["a", "b"]);
    assert_eq!(
        transport.requests(),
        [ReadRowsRequest {
            table_name: "projects/p/instances/i/tables/t".to_owned(),
            app_profile_id: "batch".to_owned(),
            rows: Some(rows),
            filter: Some(latest_only()),
            rows_limit: 10,
        }]
    );
    Ok(())
}

#[tokio::test]
async fn read_row_found() -> Result<()> {
    let transport = ScriptedTransport::new([Attempt::Respond(vec![response([row_chunk(
        "k", "v",
    )])])]);
    let table = Table::new(transport.clone(), table_path("p", "i", "t"));

    let row = table.read_row("k", None).await?;
    assert_eq!(row.map(|row| row.cells("f")[0].value().to_vec()), Some(b"v".to_vec()));

    let request = &transport.requests()[0];
    assert_eq!(request.rows_limit, 1);
    assert_eq!(request.rows.as_ref().map(|rows| rows.row_keys.clone()), Some(vec![b"k".to_vec()]));
    Ok(())
}

#[tokio::test]
async fn read_row_missing() -> Result<()> {
    let transport = ScriptedTransport::new([Attempt::Respond(vec![response([])])]);
    let table = Table::new(transport, table_path("p", "i", "t"));

    assert!(table.read_row("missing", Some(latest_only())).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn read_row_retries() -> Result<()> {
    let transport = ScriptedTransport::new([
        Attempt::Refuse(Status::unavailable("not yet")),
        Attempt::Respond(vec![response([row_chunk("k", "v")])]),
    ]);
    let table = Table::new(transport.clone(), table_path("p", "i", "t"))
        .with_retry_policy(RetryPolicy::default().with_initial_backoff(Duration::ZERO));

    assert!(table.read_row("k", None).await?.is_some());
    assert_eq!(transport.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn read_row_surfaces_errors() -> Result<()> {
    let transport = ScriptedTransport::new([Attempt::Refuse(Status::not_found("no such table"))]);
    let table = Table::new(transport, table_path("p", "i", "t"));

    let err = table.read_row("k", None).await.expect_err("table is missing");
    assert_eq!(Status::from(err).code(), tonic::Code::NotFound);
    Ok(())
}

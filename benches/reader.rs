#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    unused_results,
    clippy::unwrap_used
)]

use crate::{chunks, create_runtime};
use bigtable_rows::proto::{ReadRowsRequest, ReadRowsResponse};
use bigtable_rows::transport::{ReadRowsTransport, ResponseStream};
use bigtable_rows::RowReader;
use criterion::{criterion_group, Criterion};
use futures::{stream, StreamExt as _};
use std::future::Future;
use tonic::Status;

/// Answers every call with the same responses.
#[derive(Debug, Clone)]
struct Replay(Vec<ReadRowsResponse>);

impl ReadRowsTransport for Replay {
    fn read_rows(
        &self,
        _request: ReadRowsRequest,
    ) -> impl Future<Output = Result<ResponseStream, Status>> + Send {
        let responses = self.0.clone();
        async move { Ok(Box::pin(stream::iter(responses.into_iter().map(Ok))) as ResponseStream) }
    }
}

fn read_rows(c: &mut Criterion) {
    let runtime = create_runtime();
    let responses = chunks(1_000, 4, 1)
        .chunks(50)
        .map(|chunks| ReadRowsResponse {
            chunks: chunks.to_vec(),
            last_scanned_row_key: Vec::new(),
        })
        .collect();
    let reader = RowReader::new(Replay(responses));

    c.bench_function("read_rows", |b| {
        b.to_async(&runtime).iter(|| async {
            reader
                .read_rows(ReadRowsRequest::default())
                .fold(0, |rows, row| async move { rows + usize::from(row.is_ok()) })
                .await
        });
    });
}

criterion_group! {
    name = reader;
    config = crate::criterion_config();
    targets = read_rows
}

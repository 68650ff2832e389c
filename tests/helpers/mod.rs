#![allow(dead_code, unreachable_pub)]

use bigtable_rows::proto::cell_chunk::RowStatus;
use bigtable_rows::proto::{CellChunk, ReadRowsRequest, ReadRowsResponse};
use bigtable_rows::transport::{ReadRowsTransport, ResponseStream};
use bigtable_rows::{ReadRowsError, Row};
use futures::{stream, Stream, StreamExt as _};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tonic::Status;

/// How the scripted server answers one call.
#[derive(Debug)]
pub enum Attempt {
    /// Refuse to open the stream.
    Refuse(Status),
    /// Stream these items, then end. An `Err` item breaks the stream.
    Respond(Vec<Result<ReadRowsResponse, Status>>),
}

/// A transport answering calls from a script and recording every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Attempt>>,
    requests: Mutex<Vec<ReadRowsRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ReadRowsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReadRowsTransport for ScriptedTransport {
    fn read_rows(
        &self,
        request: ReadRowsRequest,
    ) -> impl Future<Output = Result<ResponseStream, Status>> + Send {
        self.requests.lock().unwrap().push(request);
        let attempt = self.script.lock().unwrap().pop_front();
        async move {
            match attempt {
                Some(Attempt::Refuse(status)) => Err(status),
                Some(Attempt::Respond(items)) => Ok(Box::pin(stream::iter(items)) as ResponseStream),
                None => Err(Status::failed_precondition("script exhausted")),
            }
        }
    }
}

/// A chunk carrying a whole cell of a new column.
pub fn cell(key: &str, family: &str, qualifier: &str, timestamp: i64, value: &str) -> CellChunk {
    CellChunk {
        row_key: key.as_bytes().to_vec(),
        family_name: Some(family.to_owned()),
        qualifier: Some(qualifier.as_bytes().to_vec()),
        timestamp_micros: timestamp,
        value: value.as_bytes().to_vec(),
        ..CellChunk::default()
    }
}

/// Mark `chunk` as the last of its row.
pub fn commit(mut chunk: CellChunk) -> CellChunk {
    chunk.row_status = Some(RowStatus::CommitRow(true));
    chunk
}

/// A chunk discarding the row in progress.
pub fn reset() -> CellChunk {
    CellChunk {
        row_status: Some(RowStatus::ResetRow(true)),
        ..CellChunk::default()
    }
}

/// A single-cell row in family `f`, column `q`, committed in one chunk.
pub fn row_chunk(key: &str, value: &str) -> CellChunk {
    commit(cell(key, "f", "q", 1, value))
}

/// A response carrying `chunks`.
pub fn response(chunks: impl IntoIterator<Item = CellChunk>) -> Result<ReadRowsResponse, Status> {
    Ok(ReadRowsResponse {
        chunks: chunks.into_iter().collect(),
        last_scanned_row_key: Vec::new(),
    })
}

/// A response carrying only a scan progress marker.
pub fn scanned(key: &str) -> Result<ReadRowsResponse, Status> {
    Ok(ReadRowsResponse {
        chunks: Vec::new(),
        last_scanned_row_key: key.as_bytes().to_vec(),
    })
}

/// Drain `rows`, returning the keys of the rows read and the error that ended the stream, if any.
pub async fn drain<S>(rows: S) -> (Vec<String>, Option<ReadRowsError>)
where
    S: Stream<Item = Result<Row, ReadRowsError>>,
{
    let mut rows = std::pin::pin!(rows);
    let mut keys = Vec::new();
    while let Some(row) = rows.next().await {
        match row {
            Ok(row) => keys.push(String::from_utf8(row.key().to_vec()).unwrap()),
            Err(err) => {
                assert!(rows.next().await.is_none(), "stream continued after an error");
                return (keys, Some(err));
            }
        }
    }
    (keys, None)
}

//! Streaming rows, resuming transparently when the underlying call breaks.
//!
//! A read proceeds through a small state machine:
//!
//! - `Idle`: a request is ready to be issued.
//! - `Streaming`: responses are being fed to a fresh [`ChunkProcessor`] and completed rows are
//!   yielded as they are committed.
//! - `Retrying`: the call failed with a retryable status. The original request is narrowed by
//!   [`plan_resumption`]; if anything is left and the budget allows, it is reissued after a
//!   backoff.
//! - `Done`: the server ended the stream cleanly, or nothing was left to resume.
//!
//! Any other outcome fails the read: the error is yielded as the final item of the stream.
//! Protocol violations are never retried.

use crate::chunk::ChunkProcessor;
use crate::error::ReadRowsError;
use crate::internal_macros::stream_send;
use crate::proto::ReadRowsRequest;
use crate::resume::{plan_resumption, Resumption};
use crate::retry::RetryPolicy;
use crate::row::Row;
use crate::tracing_shim::{debug, debug_span, error, warn, Instrument as _};
use crate::transport::{ReadRowsTransport, ResponseStream};
use async_stream::try_stream;
use futures::StreamExt as _;
use tonic::Status;

/// Where a read currently stands.
enum ReadState {
    /// Issue this request.
    Idle(ReadRowsRequest),
    /// Consume the responses of the current call.
    Streaming(ResponseStream),
    /// The current call failed with this status.
    Retrying(Status),
    /// The read finished successfully.
    Done,
}

/// What has been delivered to the caller across every attempt of a read.
#[derive(Debug, Default)]
struct ReadProgress {
    /// Rows yielded so far.
    rows_read: u64,
    /// Highest key known to be covered: the last row yielded or the last key the server scanned.
    last_key: Option<Vec<u8>>,
    /// Resumptions made so far.
    retries: u32,
}

/// Reads rows through a [`ReadRowsTransport`], resuming broken streams according to a
/// [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RowReader<T> {
    /// Issues the individual calls.
    transport: T,
    /// When and how often to resume.
    policy: RetryPolicy,
}

impl<T: ReadRowsTransport> RowReader<T> {
    /// Create a reader with the default [`RetryPolicy`].
    #[inline]
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    /// Create a reader with the given retry policy.
    #[inline]
    pub const fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// The transport calls are issued through.
    #[inline]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Take back the transport.
    #[inline]
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// The retry policy in effect.
    #[inline]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Stream the rows matched by `request`, in key order.
    ///
    /// Each row is yielded exactly once, even if the call has to be resumed, and only once it has
    /// been committed by the server. Nothing is requested until the stream is first polled, and
    /// dropping the stream cancels the call in flight.
    ///
    /// If the read fails, the error is the last item of the stream.
    pub fn read_rows(&self, request: ReadRowsRequest) -> stream_send!(Result<Row, ReadRowsError>, '_) {
        let span = debug_span!("read_rows", table = %request.table_name);
        try_stream! {
            let mut progress = ReadProgress::default();
            let mut state = ReadState::Idle(request.clone());

            loop {
                state = match state {
                    ReadState::Idle(attempt) => {
                        debug!(
                            retries = progress.retries,
                            rows_read = progress.rows_read,
                            rows_limit = attempt.rows_limit,
                            "issuing read rows call",
                        );
                        match self.transport.read_rows(attempt).await {
                            Ok(responses) => ReadState::Streaming(responses),
                            Err(status) => ReadState::Retrying(status),
                        }
                    }
                    ReadState::Streaming(mut responses) => {
                        let mut processor = ChunkProcessor::resuming_after(progress.last_key.clone());
                        let mut broken = None;

                        while let Some(response) = responses.next().await {
                            let response = match response {
                                Ok(response) => response,
                                Err(status) => {
                                    broken = Some(status);
                                    break;
                                }
                            };

                            for chunk in response.chunks {
                                let row = match processor.process(chunk) {
                                    Ok(row) => row,
                                    Err(err) => {
                                        error!(error = %err, rows_read = progress.rows_read, "invalid chunk stream");
                                        Err(err)?
                                    }
                                };
                                if let Some(row) = row {
                                    progress.rows_read += 1;
                                    progress.last_key = Some(row.key().to_vec());
                                    yield row;
                                }
                            }

                            if !response.last_scanned_row_key.is_empty() {
                                processor.observe_last_scanned(response.last_scanned_row_key)?;
                                progress.last_key = processor.last_key().map(<[u8]>::to_vec);
                            }
                        }

                        match broken {
                            Some(status) => ReadState::Retrying(status),
                            None => {
                                processor.finish()?;
                                ReadState::Done
                            }
                        }
                    }
                    ReadState::Retrying(status) if !self.policy.is_retryable(status.code()) => {
                        debug!(code = ?status.code(), "status is not retryable");
                        Err(status)?
                    }
                    ReadState::Retrying(status) => {
                        match plan_resumption(&request, progress.last_key.as_deref(), progress.rows_read) {
                            Resumption::Complete => {
                                debug!(rows_read = progress.rows_read, "nothing left to resume");
                                ReadState::Done
                            }
                            Resumption::Resume(next) => {
                                self.admit_retry(status, &progress)?;
                                let delay = self.policy.backoff(progress.retries);
                                progress.retries += 1;
                                if !delay.is_zero() {
                                    tokio::time::sleep(delay).await;
                                }
                                ReadState::Idle(next)
                            }
                        }
                    }
                    ReadState::Done => break,
                };
            }
        }
        .instrument(span)
    }

    /// Check the retry budget before resuming a call that failed with the retryable `status`,
    /// turning the status into the error that ends the read once the budget is spent.
    fn admit_retry(&self, status: Status, progress: &ReadProgress) -> Result<(), ReadRowsError> {
        if !self.policy.may_retry(progress.retries) {
            warn!(retries = progress.retries, "retry budget exhausted");
            return Err(status.into());
        }
        warn!(
            retries = progress.retries,
            rows_read = progress.rows_read,
            code = ?status.code(),
            status = status.message(),
            "row stream broke, resuming",
        );
        Ok(())
    }
}

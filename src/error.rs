//! Errors surfaced while reading rows.
//!
//! A [`ReadRowsError`] is what the row stream yields when it cannot continue. Both variants convert
//! into [`tonic::Status`] so that a caller living inside a gRPC service can forward them with `?`.

use crate::chunk::AssemblyState;
use crate::proto::CellChunk;
use tonic::Status;

/// The chunk stream broke the row assembly protocol.
///
/// This is never retried: replaying the same stream would fail the same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid chunk while {state}: {reason}")]
pub struct InvalidRowStateError {
    state: AssemblyState,
    reason: &'static str,
    chunk: Option<Box<CellChunk>>,
}

impl InvalidRowStateError {
    pub(crate) fn new(state: AssemblyState, reason: &'static str) -> Self {
        Self {
            state,
            reason,
            chunk: None,
        }
    }

    pub(crate) fn with_chunk(mut self, chunk: CellChunk) -> Self {
        self.chunk = Some(Box::new(chunk));
        self
    }

    /// What the processor was doing when the violation was detected.
    #[inline]
    pub const fn state(&self) -> AssemblyState {
        self.state
    }

    /// A short description of the violated rule.
    #[inline]
    pub const fn reason(&self) -> &'static str {
        self.reason
    }

    /// The offending chunk. Absent when the stream ended with a row still in progress.
    #[inline]
    pub fn chunk(&self) -> Option<&CellChunk> {
        self.chunk.as_deref()
    }
}

/// Why a row stream stopped early.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReadRowsError {
    /// The server sent a malformed chunk sequence.
    #[error(transparent)]
    InvalidRowState(#[from] InvalidRowStateError),
    /// The transport failed and could not be resumed, either because the status is not retryable
    /// or because the retry budget is exhausted.
    #[error("read rows failed: {0}")]
    Transport(Status),
}

impl From<Status> for ReadRowsError {
    fn from(status: Status) -> Self {
        Self::Transport(status)
    }
}

impl From<InvalidRowStateError> for Status {
    fn from(err: InvalidRowStateError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<ReadRowsError> for Status {
    fn from(err: ReadRowsError) -> Self {
        match err {
            ReadRowsError::InvalidRowState(err) => err.into(),
            ReadRowsError::Transport(status) => status,
        }
    }
}

//! Row assembly from a stream of cell chunks.
//!
//! The server splits every row into chunks. Each chunk carries a piece of a cell and may omit any
//! field that is unchanged from the previous chunk of the same row. Values too large for one
//! message are split over several chunks, announced by a nonzero `value_size`. A row is only
//! complete once a chunk flagged `commit_row` is seen; a chunk flagged `reset_row` throws away
//! everything received for the current row.
//!
//! [`ChunkProcessor`] validates the sequence and turns it back into [`Row`]s.

use crate::error::InvalidRowStateError;
use crate::proto::CellChunk;
use crate::row::{Cell, Row, RowBuilder};
use crate::tracing_shim::trace;
use std::fmt;
use std::mem;

/// Where the processor is within the chunk protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyState {
    /// Between rows. The next chunk must start a new row.
    NoRow,
    /// Inside a row, between cells.
    RowInProgress,
    /// Inside a cell whose value is split across chunks.
    CellInProgress,
}

impl fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoRow => "no row is in progress",
            Self::RowInProgress => "a row is in progress",
            Self::CellInProgress => "a cell is in progress",
        })
    }
}

/// Family, qualifier, timestamp and labels of the most recent cell in the row.
///
/// Replaced wholesale whenever a chunk names a new column; never shared outside the processor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CellContext {
    /// Column family.
    family: String,
    /// Column qualifier.
    qualifier: Vec<u8>,
    /// Cell version.
    timestamp_micros: i64,
    /// Labels from a label transformer.
    labels: Vec<String>,
}

impl CellContext {
    /// Resolve the context of the cell started by `chunk`, filling omitted fields from `previous`.
    ///
    /// Naming a family or qualifier starts a new column, so the timestamp and labels are taken
    /// from the chunk as is. Otherwise every omitted field carries over.
    fn resolve(previous: Self, chunk: &mut CellChunk) -> Self {
        let Self {
            family,
            qualifier,
            timestamp_micros,
            labels,
        } = previous;
        let new_column = chunk.family_name.is_some() || chunk.qualifier.is_some();

        Self {
            family: chunk.family_name.take().unwrap_or(family),
            qualifier: chunk.qualifier.take().unwrap_or(qualifier),
            timestamp_micros: if new_column || chunk.timestamp_micros != 0 {
                chunk.timestamp_micros
            } else {
                timestamp_micros
            },
            labels: if new_column || !chunk.labels.is_empty() {
                mem::take(&mut chunk.labels)
            } else {
                labels
            },
        }
    }

    /// Whether `chunk` names a different cell than this one.
    fn conflicts_with(&self, chunk: &CellChunk) -> bool {
        chunk
            .family_name
            .as_ref()
            .is_some_and(|family| *family != self.family)
            || chunk
                .qualifier
                .as_ref()
                .is_some_and(|qualifier| *qualifier != self.qualifier)
            || (chunk.timestamp_micros != 0 && chunk.timestamp_micros != self.timestamp_micros)
            || (!chunk.labels.is_empty() && chunk.labels != self.labels)
    }
}

/// Reassembles rows from cell chunks, one chunk at a time.
///
/// A processor serves a single RPC attempt. When a stream is resumed, a new processor is created
/// with [`ChunkProcessor::resuming_after`] so that no partially assembled state carries over,
/// while the key ordering check still covers rows delivered by earlier attempts.
#[derive(Debug, Default)]
pub struct ChunkProcessor {
    /// The row being assembled, if any.
    row: Option<RowBuilder>,
    /// Context inherited by chunks that omit fields. Only meaningful while a row is in progress.
    context: Option<CellContext>,
    /// Value bytes of the current cell.
    value: Vec<u8>,
    /// Whether the current cell still expects continuation chunks.
    cell_in_progress: bool,
    /// Key of the last committed row or the last scanned key reported by the server.
    last_key: Option<Vec<u8>>,
    /// Rows committed by this processor.
    rows_committed: u64,
}

impl ChunkProcessor {
    /// Create a processor for a fresh read.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor for a resumed read. Any row with a key at or before `last_key` is
    /// rejected, as it was already delivered.
    #[inline]
    pub fn resuming_after(last_key: Option<Vec<u8>>) -> Self {
        Self {
            last_key,
            ..Self::default()
        }
    }

    /// The current protocol state.
    #[inline]
    pub const fn state(&self) -> AssemblyState {
        if self.cell_in_progress {
            AssemblyState::CellInProgress
        } else if self.row.is_some() {
            AssemblyState::RowInProgress
        } else {
            AssemblyState::NoRow
        }
    }

    /// The key of the last committed row, or the last scanned key reported by the server if that
    /// is further along.
    #[inline]
    pub fn last_key(&self) -> Option<&[u8]> {
        self.last_key.as_deref()
    }

    /// How many rows this processor has committed.
    #[inline]
    pub const fn rows_committed(&self) -> u64 {
        self.rows_committed
    }

    /// Consume the next chunk of the stream. Returns the row it completes, if any.
    ///
    /// On error the processor must not be used again; the read as a whole has failed.
    pub fn process(&mut self, chunk: CellChunk) -> Result<Option<Row>, InvalidRowStateError> {
        match self.validate(&chunk) {
            Ok(()) => Ok(self.apply(chunk)),
            Err(err) => Err(err.with_chunk(chunk)),
        }
    }

    /// Record the server's report that it scanned up to `key` without finding more rows to
    /// return. Keys that do not move past the current watermark are ignored.
    pub fn observe_last_scanned(&mut self, key: Vec<u8>) -> Result<(), InvalidRowStateError> {
        if key.is_empty() {
            return Ok(());
        }
        let state = self.state();
        if state != AssemblyState::NoRow {
            return Err(InvalidRowStateError::new(
                state,
                "last scanned row key reported in the middle of a row",
            ));
        }
        if self.last_key.as_ref().map_or(true, |last_key| key > *last_key) {
            trace!(key = ?key, "advancing past last scanned row key");
            self.last_key = Some(key);
        }
        Ok(())
    }

    /// Signal the end of the stream. Fails if a row was left unterminated.
    pub fn finish(&self) -> Result<(), InvalidRowStateError> {
        match self.state() {
            AssemblyState::NoRow => Ok(()),
            state => Err(InvalidRowStateError::new(
                state,
                "stream ended before the last row was committed",
            )),
        }
    }

    /// Check `chunk` against the protocol without changing any state.
    fn validate(&self, chunk: &CellChunk) -> Result<(), InvalidRowStateError> {
        let state = self.state();
        let fail = |reason| Err(InvalidRowStateError::new(state, reason));

        if chunk.value_size < 0 {
            return fail("negative value size");
        }
        if chunk.is_commit() && chunk.value_size > 0 {
            return fail("row committed while a cell value is still incomplete");
        }

        let Some(row) = &self.row else {
            if chunk.is_reset() {
                return fail("reset without a row in progress");
            }
            if chunk.row_key.is_empty() {
                return fail("new row is missing a row key");
            }
            if let Some(last_key) = &self.last_key {
                if chunk.row_key <= *last_key {
                    return fail("row key is not greater than the previous row key");
                }
            }
            if chunk.family_name.is_none() {
                return fail("new row is missing a family name");
            }
            if chunk.qualifier.is_none() {
                return fail("new row is missing a qualifier");
            }
            return Ok(());
        };

        if chunk.is_reset() {
            if carries_data(chunk) {
                return fail("reset chunk carries cell data");
            }
            return Ok(());
        }
        if !chunk.row_key.is_empty() && chunk.row_key != row.key() {
            return fail("row key changed before the row was committed");
        }
        if chunk.family_name.is_some() && chunk.qualifier.is_none() {
            return fail("new family is missing a qualifier");
        }
        if self.cell_in_progress
            && self
                .context
                .as_ref()
                .is_some_and(|context| context.conflicts_with(chunk))
        {
            return fail("cell changed before its value was complete");
        }
        Ok(())
    }

    /// Apply a validated chunk.
    fn apply(&mut self, mut chunk: CellChunk) -> Option<Row> {
        if chunk.is_reset() {
            trace!(state = %self.state(), "row reset");
            self.reset_row();
            return None;
        }
        let commit = chunk.is_commit();

        if self.row.is_none() {
            self.row = Some(RowBuilder::new(mem::take(&mut chunk.row_key)));
            self.context = None;
        } else {
            // Already checked to repeat the key of the row in progress.
            chunk.row_key.clear();
        }

        // A bare commit chunk closes the row without adding a cell.
        let has_cell = if self.cell_in_progress {
            self.value.extend_from_slice(&chunk.value);
            self.cell_in_progress = chunk.value_size > 0;
            true
        } else if !commit || carries_data(&chunk) {
            let previous = self.context.take().unwrap_or_default();
            self.context = Some(CellContext::resolve(previous, &mut chunk));
            self.value = mem::take(&mut chunk.value);
            if chunk.value_size > 0 {
                let expected = usize::try_from(chunk.value_size).unwrap_or(0);
                self.value.reserve(expected.saturating_sub(self.value.len()));
                self.cell_in_progress = true;
            }
            true
        } else {
            false
        };

        if has_cell && !self.cell_in_progress {
            self.complete_cell();
        }

        if commit {
            self.commit_row()
        } else {
            None
        }
    }

    /// Move the accumulated value into a cell of the row in progress.
    fn complete_cell(&mut self) {
        let (Some(row), Some(context)) = (&mut self.row, &self.context) else {
            return;
        };
        row.push(Cell::new(
            context.family.clone(),
            context.qualifier.clone(),
            context.timestamp_micros,
            mem::take(&mut self.value),
            context.labels.clone(),
        ));
    }

    /// Finish the row in progress and advance the watermark.
    fn commit_row(&mut self) -> Option<Row> {
        let row = self.row.take()?.build();
        self.context = None;
        self.value.clear();
        self.last_key = Some(row.key().to_vec());
        self.rows_committed += 1;
        trace!(key = ?row.key(), cells = row.cell_count(), "row committed");
        Some(row)
    }

    /// Discard the row in progress.
    fn reset_row(&mut self) {
        self.row = None;
        self.context = None;
        self.value.clear();
        self.cell_in_progress = false;
    }
}

/// Whether the chunk carries any part of a cell, as opposed to only a row status flag.
fn carries_data(chunk: &CellChunk) -> bool {
    !chunk.row_key.is_empty()
        || chunk.family_name.is_some()
        || chunk.qualifier.is_some()
        || chunk.timestamp_micros != 0
        || !chunk.labels.is_empty()
        || !chunk.value.is_empty()
        || chunk.value_size != 0
}

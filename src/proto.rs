//! Wire messages and client of the `google.bigtable.v2` read path.
//!
//! Generated by `tonic-build` from `proto/google/bigtable/v2`, which declares the `ReadRows` call
//! and the messages it needs with the field numbers of the published service definition, so the
//! types interoperate with the real service and the emulator.

mod bigtable {
    #![allow(
        clippy::all,
        clippy::nursery,
        clippy::missing_docs_in_private_items,
        missing_docs,
        unreachable_pub,
        unused_qualifications,
        unused_results
    )]

    tonic::include_proto!("google.bigtable.v2");
}

pub(crate) use self::bigtable::bigtable_client::BigtableClient;
pub use self::bigtable::read_rows_response::{cell_chunk, CellChunk};
pub use self::bigtable::{
    row_filter, row_range, ColumnRange, ReadRowsRequest, ReadRowsResponse, RowFilter, RowRange,
    RowSet, TimestampRange, ValueRange,
};

impl CellChunk {
    /// Whether this chunk discards the row in progress.
    #[inline]
    pub const fn is_reset(&self) -> bool {
        matches!(self.row_status, Some(cell_chunk::RowStatus::ResetRow(true)))
    }

    /// Whether this chunk completes the row in progress.
    #[inline]
    pub const fn is_commit(&self) -> bool {
        matches!(self.row_status, Some(cell_chunk::RowStatus::CommitRow(true)))
    }
}

impl RowSet {
    /// Whether the set selects the whole table.
    #[inline]
    pub fn is_full_table(&self) -> bool {
        self.row_keys.is_empty() && self.row_ranges.is_empty()
    }
}

impl RowRange {
    /// The range `[start, end)`.
    pub fn closed_open(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            start_key: Some(row_range::StartKey::StartKeyClosed(start.into())),
            end_key: Some(row_range::EndKey::EndKeyOpen(end.into())),
        }
    }

    /// The range `[start, end]`.
    pub fn closed(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Self {
        Self {
            start_key: Some(row_range::StartKey::StartKeyClosed(start.into())),
            end_key: Some(row_range::EndKey::EndKeyClosed(end.into())),
        }
    }

    /// The range `(start, ∞)`.
    pub fn after(start: impl Into<Vec<u8>>) -> Self {
        Self {
            start_key: Some(row_range::StartKey::StartKeyOpen(start.into())),
            end_key: None,
        }
    }

    /// The range covering every row.
    pub const fn unbounded() -> Self {
        Self {
            start_key: None,
            end_key: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use prost::Message as _;

    // Chunks recorded from the service, each base64-decoded by hand.
    #[test]
    fn decodes_recorded_chunk() -> Result<(), prost::DecodeError> {
        let bytes = [
            0x0a, 0x02, b'R', b'K', 0x12, 0x03, 0x0a, 0x01, b'A', 0x1a, 0x03, 0x0a, 0x01, b'C',
            0x20, 0x64, 0x32, 0x03, b'v', b'a', b'l', 0x48, 0x01,
        ];
        let chunk = CellChunk::decode(&bytes[..])?;
        assert_eq!(chunk.row_key, b"RK");
        assert_eq!(chunk.family_name.as_deref(), Some("A"));
        assert_eq!(chunk.qualifier.as_deref(), Some(&b"C"[..]));
        assert_eq!(chunk.timestamp_micros, 100);
        assert_eq!(chunk.value, b"val");
        assert!(chunk.is_commit());
        assert!(!chunk.is_reset());
        Ok(())
    }

    #[test]
    fn decodes_reset_only_chunk() -> Result<(), prost::DecodeError> {
        let chunk = CellChunk::decode(&[0x40, 0x01][..])?;
        assert!(chunk.is_reset());
        assert!(chunk.row_key.is_empty());
        assert!(chunk.family_name.is_none());
        Ok(())
    }

    #[test]
    fn empty_qualifier_is_distinct_from_absent() -> Result<(), prost::DecodeError> {
        let chunk = CellChunk {
            qualifier: Some(Vec::new()),
            ..CellChunk::default()
        };
        let decoded = CellChunk::decode(chunk.encode_to_vec().as_slice())?;
        assert_eq!(decoded.qualifier, Some(Vec::new()));
        Ok(())
    }
}

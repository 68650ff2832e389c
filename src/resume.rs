//! Narrowing a read request after its stream broke.
//!
//! When a `ReadRows` stream fails part way through, the rows already handed to the caller must not
//! be requested again. [`plan_resumption`] computes the smallest request that covers exactly what
//! is left, given the key of the last committed row and how many rows were delivered.

use crate::proto::row_range::{EndKey, StartKey};
use crate::proto::{ReadRowsRequest, RowRange, RowSet};

/// What to do after a stream broke.
#[derive(Debug, Clone, PartialEq)]
pub enum Resumption {
    /// Nothing is left to read. The read ends successfully.
    Complete,
    /// Issue this request to read the remaining rows.
    Resume(ReadRowsRequest),
}

/// Compute the request that continues `original` after `rows_read` rows were delivered, the last
/// of which (or the last key the server reported scanning) was `last_key`.
///
/// This is a pure function of its arguments. It is always applied to the caller's original
/// request rather than to a previously narrowed one; narrowing the original by the latest
/// watermark gives the same result.
pub fn plan_resumption(
    original: &ReadRowsRequest,
    last_key: Option<&[u8]>,
    rows_read: u64,
) -> Resumption {
    let mut request = original.clone();

    if original.rows_limit > 0 {
        let rows_read = i64::try_from(rows_read).unwrap_or(i64::MAX);
        let remaining = original.rows_limit.saturating_sub(rows_read);
        if remaining <= 0 {
            return Resumption::Complete;
        }
        request.rows_limit = remaining;
    }

    let Some(last_key) = last_key else {
        return Resumption::Resume(request);
    };

    let rows = original.rows.clone().unwrap_or_default();
    if rows.is_full_table() {
        request.rows = Some(RowSet {
            row_keys: Vec::new(),
            row_ranges: vec![RowRange::after(last_key)],
        });
        return Resumption::Resume(request);
    }

    let row_keys: Vec<_> = rows
        .row_keys
        .into_iter()
        .filter(|key| key.as_slice() > last_key)
        .collect();
    let row_ranges: Vec<_> = rows
        .row_ranges
        .into_iter()
        .filter_map(|range| narrow_range(range, last_key))
        .collect();

    if row_keys.is_empty() && row_ranges.is_empty() {
        return Resumption::Complete;
    }

    request.rows = Some(RowSet {
        row_keys,
        row_ranges,
    });
    Resumption::Resume(request)
}

/// Remove the part of `range` at or before `last_key`. Returns `None` if nothing remains.
///
/// An empty key on either side means the range is unbounded on that side.
fn narrow_range(mut range: RowRange, last_key: &[u8]) -> Option<RowRange> {
    if let Some(EndKey::EndKeyOpen(end) | EndKey::EndKeyClosed(end)) = &range.end_key {
        if !end.is_empty() && end.as_slice() <= last_key {
            return None;
        }
    }

    let start_consumed = match &range.start_key {
        None => true,
        Some(StartKey::StartKeyClosed(start) | StartKey::StartKeyOpen(start)) => {
            start.as_slice() <= last_key
        }
    };
    if start_consumed {
        range.start_key = Some(StartKey::StartKeyOpen(last_key.to_vec()));
    }
    Some(range)
}

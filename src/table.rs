//! A handle on a single table.

use crate::error::ReadRowsError;
use crate::internal_macros::stream_send;
use crate::proto::{ReadRowsRequest, RowFilter, RowSet};
use crate::reader::RowReader;
use crate::retry::RetryPolicy;
use crate::row::Row;
use crate::transport::ReadRowsTransport;
use futures::StreamExt as _;

/// The fully qualified name of a table.
#[inline]
pub fn table_path(project: &str, instance: &str, table: &str) -> String {
    format!("projects/{project}/instances/{instance}/tables/{table}")
}

/// Reads from one table, optionally through an app profile.
#[derive(Debug, Clone)]
pub struct Table<T> {
    /// Issues and resumes the reads.
    reader: RowReader<T>,
    /// Fully qualified table name.
    table_name: String,
    /// App profile to route through. Empty for the instance default.
    app_profile_id: String,
}

impl<T: ReadRowsTransport> Table<T> {
    /// A handle on `table_name`, which must be fully qualified (see [`table_path`]).
    #[inline]
    pub fn new(transport: T, table_name: impl Into<String>) -> Self {
        Self {
            reader: RowReader::new(transport),
            table_name: table_name.into(),
            app_profile_id: String::new(),
        }
    }

    /// Route reads through the given app profile.
    #[must_use]
    #[inline]
    pub fn with_app_profile(mut self, app_profile_id: impl Into<String>) -> Self {
        self.app_profile_id = app_profile_id.into();
        self
    }

    /// Replace the retry policy of every read.
    #[must_use]
    pub fn with_retry_policy(self, policy: RetryPolicy) -> Self {
        let Self {
            reader,
            table_name,
            app_profile_id,
        } = self;
        let transport = reader.into_transport();
        Self {
            reader: RowReader::with_policy(transport, policy),
            table_name,
            app_profile_id,
        }
    }

    /// The fully qualified table name.
    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The app profile reads are routed through. Empty for the instance default.
    #[inline]
    pub fn app_profile_id(&self) -> &str {
        &self.app_profile_id
    }

    /// The request [`Table::read_rows`] would issue.
    pub fn request(
        &self,
        rows: RowSet,
        filter: Option<RowFilter>,
        rows_limit: Option<u64>,
    ) -> ReadRowsRequest {
        ReadRowsRequest {
            table_name: self.table_name.clone(),
            app_profile_id: self.app_profile_id.clone(),
            rows: Some(rows),
            filter,
            rows_limit: rows_limit.map_or(0, |limit| i64::try_from(limit).unwrap_or(i64::MAX)),
        }
    }

    /// Stream the rows in `rows`, optionally filtered, stopping after `rows_limit` rows.
    ///
    /// An empty [`RowSet`] reads the whole table. A limit of zero is the same as no limit.
    pub fn read_rows(
        &self,
        rows: RowSet,
        filter: Option<RowFilter>,
        rows_limit: Option<u64>,
    ) -> stream_send!(Result<Row, ReadRowsError>, '_) {
        self.reader.read_rows(self.request(rows, filter, rows_limit))
    }

    /// Read a single row. Returns `None` if the row does not exist or the filter removed every
    /// cell.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub async fn read_row(
        &self,
        key: impl Into<Vec<u8>> + Send,
        filter: Option<RowFilter>,
    ) -> Result<Option<Row>, ReadRowsError> {
        let rows = RowSet {
            row_keys: vec![key.into()],
            row_ranges: Vec::new(),
        };
        let mut rows = std::pin::pin!(self.read_rows(rows, filter, Some(1)));
        rows.next().await.transpose()
    }
}

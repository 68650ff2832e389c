//! Reading rows from Bigtable.
//!
//! The `ReadRows` call streams a table's contents as a sequence of [`CellChunk`]s: fragments of
//! cells, interleaved with markers that commit or discard the row being built. This crate turns
//! that sequence back into complete [`Row`]s and keeps the stream going across transient
//! failures.
//!
//! - [`chunk::ChunkProcessor`] assembles rows from chunks and rejects malformed sequences.
//! - [`resume::plan_resumption`] narrows a request to what has not been read yet.
//! - [`reader::RowReader`] drives a [`transport::ReadRowsTransport`], resuming broken streams
//!   according to a [`retry::RetryPolicy`].
//! - [`table::Table`] wraps all of the above for a single table.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use bigtable_rows::proto::{RowRange, RowSet};
//! use bigtable_rows::{table_path, GrpcTransport, Table};
//! use futures::TryStreamExt as _;
//!
//! let transport = GrpcTransport::connect("http://localhost:8086".to_owned()).await?;
//! let table = Table::new(transport, table_path("project", "instance", "table"));
//! let rows = RowSet {
//!     row_keys: Vec::new(),
//!     row_ranges: vec![RowRange::closed_open("a", "m")],
//! };
//! let rows: Vec<_> = table.read_rows(rows, None, Some(10)).try_collect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`CellChunk`]: proto::CellChunk

mod internal_macros;
mod tracing_shim;

pub mod chunk;
pub mod error;
pub mod proto;
pub mod reader;
pub mod resume;
pub mod retry;
pub mod row;
pub mod table;
pub mod transport;

use futures::Stream;
use std::pin::Pin;

/// A boxed stream that can be sent across threads.
pub type DynStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

pub use self::chunk::{AssemblyState, ChunkProcessor};
pub use self::error::{InvalidRowStateError, ReadRowsError};
pub use self::reader::RowReader;
pub use self::resume::{plan_resumption, Resumption};
pub use self::retry::RetryPolicy;
pub use self::row::{Cell, Row};
pub use self::table::{table_path, Table};
pub use self::transport::{GrpcTransport, ReadRowsTransport};

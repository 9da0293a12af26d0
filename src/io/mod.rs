//! Byte-stream adapters.
//!
//! Closure-backed sources and sinks with composable transforms:
//!
//! - **Sources**: [`ReadFunc`] with `compose`, `map`, `filter`, `take`,
//!   `retry`, `with_timeout` and `tap`
//! - **Sinks**: [`WriteFunc`] with `compose`, `tee`, `map`, `filter` and
//!   `with_metrics`
//! - **Adapters**: close, seek and positional read/write bindings

pub mod adapters;
pub mod helpers;
pub mod metrics;
pub mod read;
pub mod write;

pub use adapters::{
    CloseFunc, Closer, ReadAtFunc, ReadWriteCloser, ReaderAt, SeekFunc, WriteAtFunc, WriterAt,
};
pub use helpers::{
    BoxReader, BoxWriter, compose_readers, filter_reader, filter_writer, tee_writer, with_metrics,
};
pub use metrics::{MetricsSnapshot, WriteMetrics};
pub use read::{ReadFunc, ReadOutcome, ReadStatus};
pub use write::{WriteFunc, WriteOutcome};

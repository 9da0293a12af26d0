//! Display, error, sort and codec adapters.

pub mod codec;
pub mod error_func;
pub mod sort;
pub mod stringer;

pub use codec::{MarshalerFunc, TextMarshalerFunc, TextUnmarshalerFunc, UnmarshalerFunc};
pub use error_func::{CodedError, ErrorFunc};
pub use sort::{SortInterface, Sorter, is_sorted, sort};
pub use stringer::{FormatterFunc, StringerFunc};

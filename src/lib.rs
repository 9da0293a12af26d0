//! # purefunc
//!
//! Closure-backed adapters for common capability contracts, plus
//! combinators that compose them.
//!
//! Instead of declaring a named type to satisfy a trait, pass a closure:
//! a byte source, a byte sink, an HTTP handler, a display value, an error,
//! a sorter, a codec, a filesystem or a database driver. Every adapter
//! returns a new adapter of the same type from its combinators, so chains
//! read left to right and the last combinator applied runs first.
//!
//! ## Features
//!
//! - **Byte streams**: [`io::ReadFunc`] and [`io::WriteFunc`] with map,
//!   filter, take, retry, timeout, tap, tee and compose
//! - **HTTP middleware**: [`http::HandlerFunc`] with logging, auth,
//!   timeout, CORS and panic recovery
//! - **Values**: [`value::StringerFunc`], [`value::ErrorFunc`],
//!   [`value::SortInterface`] and JSON/text codecs
//! - **Bindings**: read-only [`fs`] and database [`driver`] contracts, with
//!   an on-disk filesystem and a `SQLite` driver
//!
//! ## Example
//!
//! ```
//! use purefunc::io::ReadFunc;
//! use std::io::{Cursor, Read};
//!
//! let mut upper = ReadFunc::from_reader(Cursor::new(b"hello world".to_vec()))
//!     .map(<[u8]>::to_ascii_uppercase);
//! let mut out = String::new();
//! upper.read_to_string(&mut out).unwrap();
//! assert_eq!(out, "HELLO WORLD");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod context;
pub mod driver;
pub mod error;
pub mod fs;
pub mod http;
pub mod io;
pub mod value;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

pub use context::{CancelHandle, Context};
pub use http::{Handler, HandlerFunc, Request, ResponseRecorder, ResponseWriter};
pub use io::{ReadFunc, ReadOutcome, ReadStatus, WriteFunc, WriteOutcome};
pub use value::{CodedError, ErrorFunc, StringerFunc};

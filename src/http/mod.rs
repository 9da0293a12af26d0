//! HTTP handler adapter, middleware chain and in-process round trips.

pub mod config;
pub mod handler;
pub mod request;
pub mod response;
pub mod round_trip;
pub mod timeout;

pub use config::{ChainConfig, CorsConfig};
pub use handler::{Handler, HandlerFunc, tracing_logger};
pub use request::Request;
pub use response::{ResponseRecorder, ResponseWriter, http_error};
pub use round_trip::{RoundTripper, RoundTripperFunc};

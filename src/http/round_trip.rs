//! Client-side counterpart of [`HandlerFunc`]: one request in, one response out.

use crate::error::{HandlerError, Result};
use crate::http::handler::HandlerFunc;
use crate::http::request::Request;
use crate::http::response::ResponseRecorder;
use std::sync::Arc;

/// Executes a single request and returns its response.
pub trait RoundTripper: Send + Sync {
    /// Sends `req` and returns the response.
    fn round_trip(&self, req: &Request) -> Result<http::Response<Vec<u8>>>;
}

type RoundTripFn = dyn Fn(&Request) -> Result<http::Response<Vec<u8>>> + Send + Sync;

/// Closure-backed [`RoundTripper`].
#[derive(Clone)]
pub struct RoundTripperFunc {
    f: Arc<RoundTripFn>,
}

impl RoundTripperFunc {
    /// Wraps a round-trip function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Result<http::Response<Vec<u8>>> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Serves every request in-process through `handler`.
    ///
    /// ```
    /// use purefunc::http::{HandlerFunc, Request, ResponseWriter, RoundTripper, RoundTripperFunc};
    ///
    /// let client = RoundTripperFunc::from_handler(HandlerFunc::new(
    ///     |w: &mut dyn ResponseWriter, req: &Request| {
    ///         let _ = w.write(req.path().as_bytes());
    ///     },
    /// ));
    /// let resp = client.round_trip(&Request::get("/ping").unwrap()).unwrap();
    /// assert_eq!(resp.body(), b"/ping");
    /// ```
    #[must_use]
    pub fn from_handler(handler: HandlerFunc) -> Self {
        Self::new(move |req: &Request| {
            let mut rec = ResponseRecorder::new();
            handler.serve(&mut rec, req);
            Ok(rec.into_response())
        })
    }

    /// A round tripper that refuses every request.
    #[must_use]
    pub fn refusing(reason: &str) -> Self {
        let reason = reason.to_string();
        Self::new(move |_: &Request| Err(HandlerError::Io(reason.clone()).into()))
    }
}

impl RoundTripper for RoundTripperFunc {
    fn round_trip(&self, req: &Request) -> Result<http::Response<Vec<u8>>> {
        (self.f)(req)
    }
}

impl std::fmt::Debug for RoundTripperFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundTripperFunc").finish_non_exhaustive()
    }
}

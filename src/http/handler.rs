//! Closure-backed request handler and middleware.
//!
//! Every `with_*` method wraps the current handler and returns a new one,
//! so the middleware applied last runs first:
//!
//! ```
//! use purefunc::http::{HandlerFunc, Request, ResponseRecorder, ResponseWriter};
//!
//! let handler = HandlerFunc::new(|w: &mut dyn ResponseWriter, _req: &Request| {
//!     let _ = w.write(b"Hello!");
//! })
//! .with_auth(|req| req.header("authorization") == Some("Bearer secret"))
//! .with_cors("*")
//! .recover();
//!
//! let mut rec = ResponseRecorder::new();
//! handler.serve(&mut rec, &Request::get("/").unwrap());
//! assert_eq!(rec.status().as_u16(), 401);
//! assert_eq!(rec.header("access-control-allow-origin"), Some("*"));
//! ```

use crate::http::config::CorsConfig;
use crate::http::request::Request;
use crate::http::response::{ResponseWriter, http_error};
use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Something that serves requests.
pub trait Handler: Send + Sync {
    /// Handles one request, writing the response into `w`.
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request);
}

type HandlerFn = dyn Fn(&mut dyn ResponseWriter, &Request) + Send + Sync;

/// Closure-backed [`Handler`] with middleware combinators.
///
/// Cloning shares the underlying closure.
#[derive(Clone)]
pub struct HandlerFunc {
    f: Arc<HandlerFn>,
}

impl HandlerFunc {
    /// Wraps a handler function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Handles one request.
    pub fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        (self.f)(w, req);
    }

    /// A handler that does nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|_: &mut dyn ResponseWriter, _: &Request| {})
    }

    /// Runs `self`, then `next`, against the same writer.
    #[must_use]
    pub fn compose(self, next: Self) -> Self {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            self.serve(w, req);
            next.serve(w, req);
        })
    }

    /// Runs `before` ahead of the handler.
    #[must_use]
    pub fn before<F>(self, before: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
    {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            before(w, req);
            self.serve(w, req);
        })
    }

    /// Runs `after` once the handler returns.
    #[must_use]
    pub fn after<F>(self, after: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
    {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            self.serve(w, req);
            after(w, req);
        })
    }

    /// Logs `Request: METHOD PATH[?QUERY]` before and `Completed: ...` after.
    #[must_use]
    pub fn with_logging<L>(self, logger: L) -> Self
    where
        L: Fn(&str) + Send + Sync + 'static,
    {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            let target = format!("{} {}", req.method(), req.path_and_query());
            logger(&format!("Request: {target}"));
            self.serve(w, req);
            logger(&format!("Completed: {target}"));
        })
    }

    /// Rejects requests failing `authenticate` with `401 Unauthorized`.
    #[must_use]
    pub fn with_auth<A>(self, authenticate: A) -> Self
    where
        A: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            if !authenticate(req) {
                http_error(w, "Unauthorized", StatusCode::UNAUTHORIZED);
                return;
            }
            self.serve(w, req);
        })
    }

    /// Adds CORS headers for `origin` and answers `OPTIONS` preflights with `200`.
    #[must_use]
    pub fn with_cors(self, origin: &str) -> Self {
        self.with_cors_config(CorsConfig::new(origin))
    }

    /// Adds CORS headers from `config` and answers `OPTIONS` preflights with `200`.
    ///
    /// Header values that are not valid header text are skipped.
    #[must_use]
    pub fn with_cors_config(self, config: CorsConfig) -> Self {
        let pairs: Vec<_> = [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, &config.allow_origin),
            (header::ACCESS_CONTROL_ALLOW_METHODS, &config.allow_methods),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, &config.allow_headers),
        ]
        .into_iter()
        .filter_map(|(name, value)| HeaderValue::from_str(value).ok().map(|v| (name, v)))
        .collect();

        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            let headers = w.headers_mut();
            for (name, value) in &pairs {
                headers.insert(name.clone(), value.clone());
            }
            if req.method() == Method::OPTIONS {
                w.write_header(StatusCode::OK);
                return;
            }
            self.serve(w, req);
        })
    }

    /// Converts a panic inside the handler into `500 Internal Server Error`.
    #[must_use]
    pub fn recover(self) -> Self {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            let result = catch_unwind(AssertUnwindSafe(|| self.serve(&mut *w, req)));
            if let Err(panic_info) = result {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    method = %req.method(),
                    path = req.path(),
                    panic = %panic_msg,
                    "handler panicked"
                );
                http_error(
                    w,
                    &format!("Internal Server Error: {panic_msg}"),
                    StatusCode::INTERNAL_SERVER_ERROR,
                );
            }
        })
    }
}

impl Handler for HandlerFunc {
    fn serve(&self, w: &mut dyn ResponseWriter, req: &Request) {
        Self::serve(self, w, req);
    }
}

impl std::fmt::Debug for HandlerFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFunc").finish_non_exhaustive()
    }
}

/// Logger that forwards middleware log lines to `tracing` at `info` level.
pub fn tracing_logger() -> impl Fn(&str) + Send + Sync + 'static {
    |line: &str| tracing::info!(target: "purefunc::http", "{line}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseRecorder;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    fn ok_handler(calls: &Arc<AtomicUsize>) -> HandlerFunc {
        let calls = Arc::clone(calls);
        HandlerFunc::new(move |w: &mut dyn ResponseWriter, _: &Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            w.write_header(StatusCode::OK);
            let _ = w.write(b"ok");
        })
    }

    fn record(handler: &HandlerFunc, req: &Request) -> ResponseRecorder {
        let mut rec = ResponseRecorder::new();
        handler.serve(&mut rec, req);
        rec
    }

    #[test]
    fn test_serve_delegates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rec = record(&ok_handler(&calls), &Request::get("/test").unwrap());
        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.body_string(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_writes_nothing() {
        let rec = record(&HandlerFunc::empty(), &Request::get("/").unwrap());
        assert!(!rec.wrote_header());
        assert!(rec.body().is_empty());
    }

    #[test]
    fn test_compose_runs_both() {
        let first = HandlerFunc::new(|w: &mut dyn ResponseWriter, _: &Request| {
            let _ = w.write(b"first;");
        });
        let second = HandlerFunc::new(|w: &mut dyn ResponseWriter, _: &Request| {
            let _ = w.write(b"second");
        });
        let rec = record(&first.compose(second), &Request::get("/").unwrap());
        assert_eq!(rec.body_string(), "first;second");
    }

    #[test]
    fn test_before_and_after() {
        let handler = HandlerFunc::new(|w: &mut dyn ResponseWriter, _: &Request| {
            let _ = w.write(b"[body]");
        })
        .before(|w: &mut dyn ResponseWriter, _: &Request| {
            let _ = w.write(b"<");
        })
        .after(|w: &mut dyn ResponseWriter, _: &Request| {
            let _ = w.write(b">");
        });
        let rec = record(&handler, &Request::get("/").unwrap());
        assert_eq!(rec.body_string(), "<[body]>");
    }

    #[test]
    fn test_with_logging_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let calls = Arc::new(AtomicUsize::new(0));
        let handler =
            ok_handler(&calls).with_logging(move |line| sink.lock().push(line.to_string()));
        record(&handler, &Request::get("/test?foo=bar").unwrap());
        assert_eq!(
            *lines.lock(),
            vec![
                "Request: GET /test?foo=bar".to_string(),
                "Completed: GET /test?foo=bar".to_string(),
            ]
        );
    }

    #[test]
    fn test_with_auth_rejects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = ok_handler(&calls).with_auth(|_| false);
        let rec = record(&handler, &Request::get("/").unwrap());
        assert_eq!(rec.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(rec.body_string().trim(), "Unauthorized");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_with_auth_accepts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = ok_handler(&calls).with_auth(|_| true);
        let rec = record(&handler, &Request::get("/").unwrap());
        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test_case(Method::GET, 1 ; "get reaches handler")]
    #[test_case(Method::POST, 1 ; "post reaches handler")]
    #[test_case(Method::OPTIONS, 0 ; "preflight short circuits")]
    fn test_with_cors(method: Method, expected_calls: usize) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = ok_handler(&calls).with_cors("https://example.com");
        let rec = record(&handler, &Request::new(method, "/test").unwrap());
        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(
            rec.header("access-control-allow-origin"),
            Some("https://example.com")
        );
        assert_eq!(
            rec.header("access-control-allow-methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(
            rec.header("access-control-allow-headers"),
            Some("Content-Type, Authorization")
        );
        assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
    }

    #[test]
    fn test_recover_from_str_panic() {
        let handler = HandlerFunc::new(|_: &mut dyn ResponseWriter, _: &Request| {
            panic!("something went wrong");
        })
        .recover();
        let rec = record(&handler, &Request::get("/test").unwrap());
        assert_eq!(rec.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(rec.body_string().contains("something went wrong"));
        assert!(rec.body_string().starts_with("Internal Server Error: "));
    }

    #[test]
    fn test_recover_from_string_panic() {
        let handler = HandlerFunc::new(|_: &mut dyn ResponseWriter, req: &Request| {
            panic!("bad path {}", req.path());
        })
        .recover();
        let rec = record(&handler, &Request::get("/boom").unwrap());
        assert_eq!(rec.body_string(), "Internal Server Error: bad path /boom\n");
    }

    #[test]
    fn test_recover_passes_through_normal_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rec = record(&ok_handler(&calls).recover(), &Request::get("/").unwrap());
        assert_eq!(rec.status(), StatusCode::OK);
        assert_eq!(rec.body_string(), "ok");
    }

    #[test]
    fn test_order_cors_outside_auth() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = ok_handler(&calls).with_auth(|_| false).with_cors("*");
        let preflight = record(&handler, &Request::new(Method::OPTIONS, "/").unwrap());
        assert_eq!(preflight.status(), StatusCode::OK);

        let get = record(&handler, &Request::get("/").unwrap());
        assert_eq!(get.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(get.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn test_order_auth_outside_cors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = ok_handler(&calls).with_cors("*").with_auth(|_| false);
        let preflight = record(&handler, &Request::new(Method::OPTIONS, "/").unwrap());
        assert_eq!(preflight.status(), StatusCode::UNAUTHORIZED);
        assert!(preflight.header("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_tracing_logger_is_callable() {
        let logger = tracing_logger();
        logger("Request: GET /");
    }
}

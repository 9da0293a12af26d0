//! Deadline-bound handler execution.
//!
//! The wrapped handler runs on a scoped thread and writes through a
//! [`TimeoutWriter`]. Once the deadline fires the writer rejects every
//! further write, so a straggling handler can never interleave with the
//! timeout response.

use crate::error::HandlerError;
use crate::http::handler::HandlerFunc;
use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crossbeam::channel;
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use std::panic::resume_unwind;
use std::thread;
use std::time::Duration;

const TIMEOUT_BODY: &[u8] = b"Request timeout\n";

struct Guarded<'a> {
    target: &'a mut dyn ResponseWriter,
    wrote: bool,
    timed_out: bool,
}

/// Writer handed to the handler thread.
///
/// Headers are staged locally and copied to the real writer on the first
/// status or body write.
struct TimeoutWriter<'g, 'a> {
    guarded: &'g Mutex<Guarded<'a>>,
    headers: HeaderMap,
}

impl TimeoutWriter<'_, '_> {
    fn commit(&self, guarded: &mut Guarded<'_>) {
        if !guarded.wrote {
            guarded.wrote = true;
            *guarded.target.headers_mut() = self.headers.clone();
        }
    }
}

impl ResponseWriter for TimeoutWriter<'_, '_> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        let mut guarded = self.guarded.lock();
        if guarded.timed_out || guarded.wrote {
            return;
        }
        self.commit(&mut guarded);
        guarded.target.write_header(status);
    }

    fn write(&mut self, body: &[u8]) -> Result<usize, HandlerError> {
        let mut guarded = self.guarded.lock();
        if guarded.timed_out {
            return Err(HandlerError::Timeout);
        }
        self.commit(&mut guarded);
        guarded.target.write(body)
    }
}

impl HandlerFunc {
    /// Bounds the handler by `timeout`.
    ///
    /// The handler sees a request whose context expires at the deadline. If
    /// the deadline fires first, later writes fail with
    /// [`HandlerError::Timeout`], and once the handler returns a
    /// `408 Request Timeout` is written unless the handler already started
    /// its response. Headers the handler set before the deadline are kept
    /// on the 408. A timeout too large to form a deadline never fires. The
    /// call always waits for the handler to finish. A panic in the handler
    /// resumes on the calling thread.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self::new(move |w: &mut dyn ResponseWriter, req: &Request| {
            let (ctx, cancel) = req.context().with_timeout(timeout);
            let deadline = ctx.deadline();
            let scoped = req.with_context(ctx);
            let headers = w.headers_mut().clone();
            let guarded = Mutex::new(Guarded {
                target: w,
                wrote: false,
                timed_out: false,
            });

            let handler = &self;
            let (expired, joined) = thread::scope(|s| {
                let (done_tx, done_rx) = channel::bounded::<()>(0);
                let mut writer = TimeoutWriter {
                    guarded: &guarded,
                    headers,
                };
                let scoped = &scoped;
                let worker = s.spawn(move || {
                    let _done = done_tx;
                    handler.serve(&mut writer, scoped);
                    writer.headers
                });

                let timer = deadline.map_or_else(channel::never, channel::at);
                let expired = crossbeam::select! {
                    recv(done_rx) -> _ => false,
                    recv(timer) -> _ => {
                        guarded.lock().timed_out = true;
                        true
                    }
                };
                (expired, worker.join())
            });
            cancel.cancel();

            let staged = match joined {
                Ok(staged) => staged,
                Err(payload) => resume_unwind(payload),
            };
            let mut guarded = guarded.into_inner();
            if expired {
                tracing::warn!(
                    method = %req.method(),
                    path = req.path(),
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "handler timed out"
                );
                if !guarded.wrote {
                    *guarded.target.headers_mut() = staged;
                    guarded.target.write_header(StatusCode::REQUEST_TIMEOUT);
                    let _ = guarded.target.write(TIMEOUT_BODY);
                }
            } else if !guarded.wrote {
                *guarded.target.headers_mut() = staged;
            }
        })
    }
}

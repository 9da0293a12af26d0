//! Response sink contract and an in-memory recorder.

use crate::error::HandlerError;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;

/// Sink a handler writes its response into.
pub trait ResponseWriter: Send {
    /// Mutable access to the response headers. Changes after the status is
    /// written have no effect on the recorded status line.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Writes the status line. Only the first call takes effect.
    fn write_header(&mut self, status: StatusCode);

    /// Appends body bytes, implicitly writing `200 OK` if no status was written.
    fn write(&mut self, body: &[u8]) -> Result<usize, HandlerError>;
}

/// Writes a plain-text error response: `message` plus a trailing newline.
pub fn http_error(w: &mut dyn ResponseWriter, message: &str, status: StatusCode) {
    let headers = w.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.remove(header::CONTENT_LENGTH);
    w.write_header(status);
    let _ = w.write(format!("{message}\n").as_bytes());
}

/// In-memory [`ResponseWriter`] used for tests and in-process round trips.
#[derive(Debug, Default, Clone)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded status, `200 OK` if none was written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns `true` once a status line has been written.
    #[must_use]
    pub const fn wrote_header(&self) -> bool {
        self.status.is_some()
    }

    /// Recorded headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Recorded body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts the recording into an `http::Response`.
    #[must_use]
    pub fn into_response(self) -> http::Response<Vec<u8>> {
        let status = self.status();
        let mut response = http::Response::new(self.body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if let Some(current) = self.status {
            tracing::trace!(%current, ignored = %status, "superfluous write_header call");
            return;
        }
        self.status = Some(status);
    }

    fn write(&mut self, body: &[u8]) -> Result<usize, HandlerError> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(body);
        Ok(body.len())
    }
}

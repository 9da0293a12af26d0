//! Request descriptor passed to handlers.

use crate::context::Context;
use crate::error::HandlerError;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};

/// Incoming request: method, URI, headers, body and a cancellation context.
///
/// # Examples
///
/// ```
/// use purefunc::http::Request;
///
/// let req = Request::get("/users?id=7")
///     .unwrap()
///     .with_header("authorization", "Bearer secret")
///     .unwrap();
/// assert_eq!(req.path(), "/users");
/// assert_eq!(req.query(), Some("id=7"));
/// assert_eq!(req.header("Authorization"), Some("Bearer secret"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Vec<u8>,
    context: Context,
}

impl Request {
    /// Creates a request with an empty body and the background context.
    pub fn new(method: Method, uri: &str) -> Result<Self, HandlerError> {
        let uri = uri
            .parse::<Uri>()
            .map_err(|e| HandlerError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Vec::new(),
            context: Context::background(),
        })
    }

    /// Creates a `GET` request.
    pub fn get(uri: &str) -> Result<Self, HandlerError> {
        Self::new(Method::GET, uri)
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HandlerError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HandlerError::InvalidRequest(e.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| HandlerError::InvalidRequest(e.to_string()))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a copy of this request carrying `context`.
    #[must_use]
    pub fn with_context(&self, context: Context) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Full request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Path plus `?query` when a query is present.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.query() {
            Some(q) if !q.is_empty() => format!("{}?{q}", self.path()),
            _ => self.path().to_string(),
        }
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name` if it is valid visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Cancellation context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }
}

impl From<http::Request<Vec<u8>>> for Request {
    fn from(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();
        let context = parts
            .extensions
            .get::<Context>()
            .cloned()
            .unwrap_or_default();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            context,
        }
    }
}

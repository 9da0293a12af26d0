//! Serializable middleware configuration.

use crate::error::{Error, Result};
use crate::http::handler::{HandlerFunc, tracing_logger};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const DEFAULT_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// CORS header values written by [`HandlerFunc::with_cors_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `Access-Control-Allow-Origin`.
    pub allow_origin: String,
    /// `Access-Control-Allow-Methods`.
    pub allow_methods: String,
    /// `Access-Control-Allow-Headers`.
    pub allow_headers: String,
}

impl CorsConfig {
    /// Default method and header lists for the given origin.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            allow_origin: origin.into(),
            ..Self::default()
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: DEFAULT_ALLOW_METHODS.to_string(),
            allow_headers: DEFAULT_ALLOW_HEADERS.to_string(),
        }
    }
}

/// Declarative middleware stack.
///
/// [`ChainConfig::apply`] wraps in the order timeout, CORS, recover, logging,
/// so logging is the outermost layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Handler deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// CORS headers to add.
    pub cors: Option<CorsConfig>,
    /// Convert panics into `500` responses.
    pub recover: bool,
    /// Log each request through `tracing`.
    pub log: bool,
}

impl ChainConfig {
    /// Parses a chain configuration from JSON.
    ///
    /// ```
    /// use purefunc::http::ChainConfig;
    ///
    /// let config = ChainConfig::from_json(r#"{"timeout_ms": 50, "recover": true}"#).unwrap();
    /// assert_eq!(config.timeout_ms, Some(50));
    /// assert!(config.cors.is_none());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field values that deserialize but cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == Some(0) {
            return Err(Error::Config {
                message: "timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Wraps `handler` in the configured middleware.
    #[must_use]
    pub fn apply(&self, handler: HandlerFunc) -> HandlerFunc {
        let mut handler = handler;
        if let Some(ms) = self.timeout_ms {
            handler = handler.with_timeout(Duration::from_millis(ms));
        }
        if let Some(cors) = &self.cors {
            handler = handler.with_cors_config(cors.clone());
        }
        if self.recover {
            handler = handler.recover();
        }
        if self.log {
            handler = handler.with_logging(tracing_logger());
        }
        tracing::debug!(
            timeout_ms = ?self.timeout_ms,
            cors = self.cors.is_some(),
            recover = self.recover,
            log = self.log,
            "applied middleware chain"
        );
        handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Request;
    use crate::http::response::{ResponseRecorder, ResponseWriter};
    use http::{Method, StatusCode};

    #[test]
    fn test_cors_defaults() {
        let cors = CorsConfig::default();
        assert_eq!(cors.allow_origin, "*");
        assert_eq!(cors.allow_methods, "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(cors.allow_headers, "Content-Type, Authorization");
    }

    #[test]
    fn test_cors_partial_json() {
        let cors: CorsConfig =
            serde_json::from_str(r#"{"allow_origin": "https://example.com"}"#).unwrap();
        assert_eq!(cors, CorsConfig::new("https://example.com"));
    }

    #[test]
    fn test_chain_from_json_full() {
        let config = ChainConfig::from_json(
            r#"{"timeout_ms": 250, "cors": {"allow_origin": "*"}, "recover": true, "log": true}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, Some(250));
        assert_eq!(config.cors, Some(CorsConfig::default()));
        assert!(config.recover);
        assert!(config.log);
    }

    #[test]
    fn test_chain_from_json_empty_object() {
        assert_eq!(ChainConfig::from_json("{}").unwrap(), ChainConfig::default());
    }

    #[test]
    fn test_chain_rejects_bad_json() {
        let err = ChainConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_chain_rejects_zero_timeout() {
        let err = ChainConfig::from_json(r#"{"timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_apply_recover_and_cors() {
        let config = ChainConfig {
            cors: Some(CorsConfig::new("https://app.test")),
            recover: true,
            ..ChainConfig::default()
        };
        let handler = config.apply(HandlerFunc::new(
            |_: &mut dyn ResponseWriter, _: &Request| panic!("kaboom"),
        ));

        let mut rec = ResponseRecorder::new();
        handler.serve(&mut rec, &Request::get("/").unwrap());
        assert_eq!(rec.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rec.header("access-control-allow-origin"), Some("https://app.test"));

        let mut preflight = ResponseRecorder::new();
        handler.serve(&mut preflight, &Request::new(Method::OPTIONS, "/").unwrap());
        assert_eq!(preflight.status(), StatusCode::OK);
    }

    #[test]
    fn test_apply_empty_is_passthrough() {
        let handler = ChainConfig::default().apply(HandlerFunc::new(
            |w: &mut dyn ResponseWriter, _: &Request| {
                let _ = w.write(b"plain");
            },
        ));
        let mut rec = ResponseRecorder::new();
        handler.serve(&mut rec, &Request::get("/").unwrap());
        assert_eq!(rec.body_string(), "plain");
        assert!(rec.header("access-control-allow-origin").is_none());
    }
}

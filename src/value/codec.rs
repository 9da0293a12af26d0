//! JSON and text codec adapters.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use std::fmt;

type MarshalFn = dyn Fn() -> Result<serde_json::Value, CodecError> + Send + Sync;

/// Closure-backed JSON producer.
///
/// Implements [`Serialize`], so it can be nested inside any other
/// serializable value.
///
/// ```
/// use purefunc::value::MarshalerFunc;
/// use serde_json::json;
///
/// let m = MarshalerFunc::new(|| Ok(json!({"id": 7})));
/// assert_eq!(m.marshal_json().unwrap(), br#"{"id":7}"#);
/// assert_eq!(serde_json::to_string(&vec![m]).unwrap(), r#"[{"id":7}]"#);
/// ```
pub struct MarshalerFunc {
    f: Box<MarshalFn>,
}

impl MarshalerFunc {
    /// Wraps a value-producing function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<serde_json::Value, CodecError> + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Snapshots any serializable value at construction time.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        let value = serde_json::to_value(value)?;
        Ok(Self::new(move || Ok(value.clone())))
    }

    /// Produces the JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, CodecError> {
        (self.f)()
    }

    /// Produces compact JSON bytes.
    pub fn marshal_json(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&self.to_value()?)?)
    }
}

impl Serialize for MarshalerFunc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl fmt::Debug for MarshalerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarshalerFunc").finish_non_exhaustive()
    }
}

type UnmarshalFn = dyn FnMut(&[u8]) -> Result<(), CodecError> + Send;

/// Closure-backed JSON consumer.
pub struct UnmarshalerFunc {
    f: Box<UnmarshalFn>,
}

impl UnmarshalerFunc {
    /// Wraps a byte-consuming function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&[u8]) -> Result<(), CodecError> + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Decodes bytes as `T` and hands each decoded value to `sink`.
    pub fn decoding<T, F>(mut sink: F) -> Self
    where
        T: DeserializeOwned,
        F: FnMut(T) + Send + 'static,
    {
        Self::new(move |data: &[u8]| {
            sink(serde_json::from_slice(data)?);
            Ok(())
        })
    }

    /// Consumes one JSON document.
    pub fn unmarshal_json(&mut self, data: &[u8]) -> Result<(), CodecError> {
        (self.f)(data)
    }
}

impl fmt::Debug for UnmarshalerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnmarshalerFunc").finish_non_exhaustive()
    }
}

type MarshalTextFn = dyn Fn() -> Result<String, CodecError> + Send + Sync;

/// Closure-backed text producer. Serializes as a JSON string.
pub struct TextMarshalerFunc {
    f: Box<MarshalTextFn>,
}

impl TextMarshalerFunc {
    /// Wraps a text-producing function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<String, CodecError> + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Produces the text form.
    pub fn marshal_text(&self) -> Result<String, CodecError> {
        (self.f)()
    }
}

impl Serialize for TextMarshalerFunc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self
            .marshal_text()
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_str(&text)
    }
}

impl fmt::Debug for TextMarshalerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextMarshalerFunc").finish_non_exhaustive()
    }
}

type UnmarshalTextFn = dyn FnMut(&str) -> Result<(), CodecError> + Send;

/// Closure-backed text consumer.
pub struct TextUnmarshalerFunc {
    f: Box<UnmarshalTextFn>,
}

impl TextUnmarshalerFunc {
    /// Wraps a text-consuming function.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&str) -> Result<(), CodecError> + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Consumes `text`, which must be UTF-8.
    pub fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), CodecError> {
        let text = std::str::from_utf8(text)
            .map_err(|e| CodecError::Invalid(format!("text is not UTF-8: {e}")))?;
        (self.f)(text)
    }
}

impl fmt::Debug for TextUnmarshalerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextUnmarshalerFunc").finish_non_exhaustive()
    }
}

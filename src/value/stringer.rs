//! Display adapters.

use std::fmt;
use std::sync::Arc;

/// Closure-backed [`Display`](fmt::Display) value.
///
/// Forms a monoid under [`compose`](Self::compose) with [`empty`](Self::empty)
/// as identity.
///
/// ```
/// use purefunc::value::StringerFunc;
///
/// let greeting = StringerFunc::new(|| "Hello".to_string()).with_suffix(", World!");
/// assert_eq!(greeting.to_string(), "Hello, World!");
/// ```
#[derive(Clone)]
pub struct StringerFunc {
    f: Arc<dyn Fn() -> String + Send + Sync>,
}

impl StringerFunc {
    /// Wraps a string-producing function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// A stringer for a fixed value.
    #[must_use]
    pub fn constant(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(move || value.clone())
    }

    /// Produces the string.
    #[must_use]
    pub fn string(&self) -> String {
        (self.f)()
    }

    /// The empty string.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(String::new)
    }

    /// Concatenates `self` and `other`.
    #[must_use]
    pub fn compose(self, other: Self) -> Self {
        Self::new(move || {
            let mut out = self.string();
            out.push_str(&other.string());
            out
        })
    }

    /// Joins `self` and `others` with `sep`.
    #[must_use]
    pub fn join(self, sep: &str, others: Vec<Self>) -> Self {
        let sep = sep.to_string();
        let mut all = Vec::with_capacity(others.len() + 1);
        all.push(self);
        all.extend(others);
        Self::new(move || {
            all.iter()
                .map(Self::string)
                .collect::<Vec<_>>()
                .join(&sep)
        })
    }

    /// Transforms the produced string.
    #[must_use]
    pub fn map<F>(self, transform: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        Self::new(move || transform(self.string()))
    }

    /// Prepends `prefix`.
    #[must_use]
    pub fn with_prefix(self, prefix: &str) -> Self {
        let prefix = prefix.to_string();
        Self::new(move || format!("{prefix}{}", self.string()))
    }

    /// Appends `suffix`.
    #[must_use]
    pub fn with_suffix(self, suffix: &str) -> Self {
        let suffix = suffix.to_string();
        Self::new(move || format!("{}{suffix}", self.string()))
    }
}

impl fmt::Display for StringerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}

impl fmt::Debug for StringerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StringerFunc").field(&self.string()).finish()
    }
}

/// Closure-backed formatter: the closure writes straight into the
/// [`fmt::Formatter`], so width, precision and flags are visible to it.
#[derive(Clone)]
pub struct FormatterFunc {
    f: Arc<dyn Fn(&mut fmt::Formatter<'_>) -> fmt::Result + Send + Sync>,
}

impl FormatterFunc {
    /// Wraps a formatting function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

impl fmt::Display for FormatterFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.f)(f)
    }
}

impl fmt::Debug for FormatterFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.f)(f)
    }
}

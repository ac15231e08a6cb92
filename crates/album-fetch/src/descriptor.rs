//! Request descriptors.

use std::collections::BTreeMap;

use album_core::{HttpRequest, Method};
use serde_json::Value;

/// Inputs whose change supersedes the in-flight request.
///
/// Compared element by element; an empty key never changes, so the
/// request is issued once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationKey(Vec<Value>);

impl ActivationKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a part.
    #[must_use]
    pub fn with(mut self, part: impl Into<Value>) -> Self {
        self.0.push(part.into());
        self
    }

    #[must_use]
    pub fn parts(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for ActivationKey {
    fn from(parts: Vec<Value>) -> Self {
        Self(parts)
    }
}

impl<V: Into<Value>> FromIterator<V> for ActivationKey {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Method, headers and body of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn into_request(self, url: String) -> HttpRequest {
        HttpRequest {
            url,
            method: self.method,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// One evaluation's worth of fetch inputs.
///
/// Built fresh on every evaluation; only `activation_key` and `enabled`
/// decide whether a new request is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchDescriptor<T> {
    pub locator: String,
    pub options: RequestOptions,
    pub activation_key: ActivationKey,
    pub default_data: Option<T>,
    pub enabled: bool,
}

impl<T> FetchDescriptor<T> {
    /// Enabled GET descriptor with an empty activation key.
    #[must_use]
    pub fn get(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            options: RequestOptions::default(),
            activation_key: ActivationKey::default(),
            default_data: None,
            enabled: true,
        }
    }

    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn key(mut self, key: ActivationKey) -> Self {
        self.activation_key = key;
        self
    }

    #[must_use]
    pub fn default_data(mut self, data: T) -> Self {
        self.default_data = Some(data);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

//! Core traits for storage, notification and transport.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Synchronous key-value store backing the session.
///
/// Every call completes before returning; the session store relies on
/// this to persist a transition before publishing it.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a single key. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// Sink for user-facing messages.
///
/// Implement this trait to surface validation messages in your UI.
pub trait Notifier: Send + Sync {
    /// Show a message to the user.
    fn notify(&self, message: &str);
}

/// HTTP method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Create a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Settled response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request was aborted before it settled.
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

/// Trait for HTTP backends.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and wait for the full response body.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl HttpTransport for Echo {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(200, request.url.clone()))
        }
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
    }

    #[test]
    fn test_transport_object_safety() {
        let transport: Box<dyn HttpTransport> = Box::new(Echo);
        let response = tokio_test::block_on(transport.send(&HttpRequest::get("/users"))).unwrap();
        assert_eq!(response.body, Bytes::from_static(b"/users"));
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(serde_json::to_string(&Method::Delete).unwrap(), "\"DELETE\"");
        assert_eq!(HttpRequest::get("x").method, Method::Get);
    }
}

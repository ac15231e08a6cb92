//! HTTP transport backed by `reqwest`.

use std::time::Duration;

use album_core::{AppConfig, HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
use async_trait::async_trait;
use reqwest::Client;

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(map_error)?;

        Ok(Self { http })
    }

    /// Build a transport from the configured request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        Self::new(config.request_timeout)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(url = %request.url, method = ?request.method), level = "debug")]
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_error)?;

        tracing::debug!(status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(Method::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = ReqwestTransport::from_config(&AppConfig::default()).unwrap();
        let err = transport
            .send(&HttpRequest::get("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Other(_)));
    }
}

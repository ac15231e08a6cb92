//! Scripted transport for tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use album_core::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

type Reply = Result<HttpResponse, TransportError>;

enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<Reply>),
}

/// Transport that answers from per-URL queues of scripted replies.
///
/// Replies for one URL are consumed in the order they were scripted. A
/// request with nothing scripted fails with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

/// Holds a gated request open until released.
pub struct Gate {
    tx: oneshot::Sender<Reply>,
}

impl Gate {
    /// Release the request with `reply`. A no-op if it was already dropped.
    pub fn reply(self, reply: Reply) {
        let _ = self.tx.send(reply);
    }

    /// Release the request with a JSON body.
    pub fn json(self, status: u16, body: Value) {
        self.reply(Ok(HttpResponse::new(status, body.to_string())));
    }

    /// Resolves once the waiting request has been dropped.
    pub async fn closed(mut self) {
        self.tx.closed().await;
    }
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, url: impl Into<String>, scripted: Scripted) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(url.into()).or_default().push_back(scripted);
        }
    }

    /// Script an immediate reply.
    pub fn reply(&self, url: impl Into<String>, reply: Reply) {
        self.push(url, Scripted::Ready(reply));
    }

    /// Script an immediate JSON reply.
    pub fn json(&self, url: impl Into<String>, status: u16, body: Value) {
        self.reply(url, Ok(HttpResponse::new(status, body.to_string())));
    }

    /// Script a reply that waits for the returned gate.
    #[must_use]
    pub fn gate(&self, url: impl Into<String>) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(url, Scripted::Gated(rx));
        Gate { tx }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self
            .routes
            .lock()
            .ok()
            .and_then(|mut routes| routes.get_mut(&request.url).and_then(VecDeque::pop_front));

        match scripted {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Gated(rx)) => rx.await.unwrap_or(Err(TransportError::Cancelled)),
            None => Err(TransportError::Other(format!(
                "no scripted reply for {}",
                request.url
            ))),
        }
    }
}

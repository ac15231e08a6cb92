//! Cancellable fetch resource.

use std::sync::Arc;

use album_core::{HttpRequest, HttpTransport, TransportError};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    descriptor::{ActivationKey, FetchDescriptor},
    state::{FetchError, FetchState},
};

struct InFlight {
    token: CancellationToken,
    request_id: Uuid,
}

/// One fetch call site.
///
/// Feed it a fresh [`FetchDescriptor`] on every evaluation. A request is
/// issued only when the activation key changes (or on the first enabled
/// evaluation); issuing one cancels its predecessor. A canceled request
/// never touches the state, so only the latest request can settle it.
///
/// Dropping the resource cancels whatever is in flight.
pub struct FetchResource<T> {
    transport: Arc<dyn HttpTransport>,
    state: Arc<watch::Sender<FetchState<T>>>,
    in_flight: Option<InFlight>,
    issued: Option<ActivationKey>,
    evaluated: bool,
}

impl<T> FetchResource<T> {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(watch::Sender::new(FetchState::default())),
            in_flight: None,
            issued: None,
            evaluated: false,
        }
    }

    /// Receiver that is marked changed on every state update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Cancel the in-flight request, if any.
    ///
    /// The state is left as is. The next enabled evaluation issues a new
    /// request even if its activation key is unchanged.
    pub fn cancel(&mut self) {
        self.issued = None;
        if let Some(in_flight) = self.in_flight.take() {
            // Cancel under the state lock so a settling request cannot
            // slip in between.
            self.state.send_if_modified(|_| {
                in_flight.token.cancel();
                false
            });
            tracing::debug!(request_id = %in_flight.request_id, "request cancelled");
        }
    }
}

impl<T> FetchResource<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Stream of states, starting with the current one.
    #[must_use]
    pub fn stream(&self) -> WatchStream<FetchState<T>> {
        WatchStream::new(self.state.subscribe())
    }

    /// Wait until the state is no longer loading.
    ///
    /// Never completes if the live request was canceled and nothing new
    /// was issued.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|state| !state.loading).await.map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }
}

impl<T> FetchResource<T>
where
    T: DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    /// Evaluate a descriptor and return the resulting state.
    ///
    /// # Panics
    /// Panics if a request must be issued outside a Tokio runtime.
    pub fn evaluate(&mut self, descriptor: FetchDescriptor<T>) -> FetchState<T> {
        let FetchDescriptor {
            locator,
            options,
            activation_key,
            default_data,
            enabled,
        } = descriptor;

        let first = !self.evaluated;
        self.evaluated = true;

        if !enabled {
            self.issued = None;
            let previous = self.in_flight.take();
            self.state.send_if_modified(|state| {
                if let Some(previous) = &previous {
                    previous.token.cancel();
                }
                let idle = FetchState::idle(default_data);
                if *state == idle {
                    false
                } else {
                    *state = idle;
                    true
                }
            });
            if let Some(previous) = previous {
                tracing::debug!(request_id = %previous.request_id, "request cancelled by disable");
            }
            return self.state();
        }

        if self.issued.as_ref() == Some(&activation_key) {
            return self.state();
        }

        let token = CancellationToken::new();
        let request_id = Uuid::new_v4();
        let previous = self.in_flight.replace(InFlight {
            token: token.clone(),
            request_id,
        });
        self.issued = Some(activation_key);

        self.state.send_modify(|state| {
            if let Some(previous) = &previous {
                previous.token.cancel();
            }
            if first {
                state.data = default_data;
            }
            state.loading = true;
            state.error = None;
        });
        if let Some(previous) = previous {
            tracing::debug!(request_id = %previous.request_id, "request superseded");
        }

        let span = tracing::debug_span!("fetch", %request_id, url = %locator);
        let request = options.into_request(locator);
        tokio::spawn(
            run_request(
                Arc::clone(&self.transport),
                request,
                token,
                Arc::clone(&self.state),
            )
            .instrument(span),
        );

        self.state()
    }
}

impl<T> Drop for FetchResource<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_request<T>(
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    token: CancellationToken,
    state: Arc<watch::Sender<FetchState<T>>>,
) where
    T: DeserializeOwned,
{
    tracing::debug!("request issued");

    let result = tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::debug!("request dropped after cancellation");
            return;
        }
        result = transport.send(&request) => result,
    };

    let outcome: Result<T, FetchError> = match result {
        Err(TransportError::Cancelled) if token.is_cancelled() => {
            tracing::debug!("transport reported cancellation");
            return;
        }
        Err(e) => Err(e.into()),
        Ok(response) if !response.is_success() => Err(FetchError::Status(response.status)),
        Ok(response) => serde_json::from_slice(&response.body).map_err(FetchError::from),
    };
    let error = outcome.as_ref().err().map(ToString::to_string);

    let applied = state.send_if_modified(|state| {
        if token.is_cancelled() {
            return false;
        }
        match outcome {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
            }
            Err(e) => state.error = Some(e.to_string()),
        }
        state.loading = false;
        true
    });

    match (applied, error) {
        (false, _) => tracing::debug!("result discarded after cancellation"),
        (true, None) => tracing::debug!("request settled"),
        (true, Some(error)) => tracing::warn!(%error, "request failed"),
    }
}

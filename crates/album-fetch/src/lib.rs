//! Cancellable fetch resource for the album browser.
//!
//! Provides:
//! - `FetchResource` - One call site's request lifecycle and state
//! - `FetchDescriptor` - Per-evaluation request inputs
//! - `ReqwestTransport` - HTTP transport (feature: reqwest)
//! - `ScriptedTransport` - In-process transport for tests (feature: testing)

pub mod descriptor;
pub mod resource;
pub mod state;

#[cfg(feature = "reqwest")]
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use descriptor::{ActivationKey, FetchDescriptor, RequestOptions};
pub use resource::FetchResource;
pub use state::{FetchError, FetchState};

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;

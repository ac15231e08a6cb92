//! Fetch state and errors.

use album_core::TransportError;
use thiserror::Error;

/// Snapshot of a fetch call site.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    /// Not loading, no error, holding `data`.
    #[must_use]
    pub const fn idle(data: Option<T>) -> Self {
        Self {
            data,
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }
}

/// Why a request failed to produce data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx status; displays as the bare code.
    #[error("{0}")]
    Status(u16),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

//! Persisted session store for the album browser.
//!
//! Provides:
//! - `SessionStore` - Single source of truth for the login session
//! - `reduce` - The pure transition function behind it
//! - Key-value storage implementations (memory, file)

pub mod notifier;
pub mod reducer;
pub mod storage;
pub mod store;

pub use album_core::{LoginPolicy, LogoutScope};
pub use notifier::{RecordingNotifier, TracingNotifier};
pub use reducer::{SessionAction, reduce};
pub use store::{SESSION_KEY, SessionStore, SessionStoreBuilder, StoreError};

//! Core abstractions for the album browser.
//!
//! This crate provides the fundamental building blocks:
//! - `Session` and the remote resource models
//! - `ApiEndpoints` - Locators for the remote resources
//! - `AppConfig` - Environment-driven configuration
//! - Storage, notifier and transport traits

pub mod api;
pub mod config;
pub mod model;
pub mod traits;

pub use api::ApiEndpoints;
pub use config::{AppConfig, ConfigError, LoginPolicy, LoginRejection, LogoutScope};
pub use model::{Album, LoginUser, Photo, Session, User};
pub use traits::{
    HttpRequest, HttpResponse, HttpTransport, KeyValueStore, Method, Notifier, StorageError,
    TransportError,
};

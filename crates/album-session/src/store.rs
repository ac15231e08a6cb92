//! Persisted session store.

use std::sync::{Arc, Mutex, PoisonError};

use album_core::{
    Album, AppConfig, KeyValueStore, LoginPolicy, LoginUser, LogoutScope, Notifier, Session,
    StorageError,
};
use tokio::sync::watch;

use crate::{
    notifier::TracingNotifier,
    reducer::{SessionAction, reduce},
};

/// Key of the session record in the key-value store.
pub const SESSION_KEY: &str = "session";

/// Session store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Single source of truth for the session.
///
/// Every transition is computed by [`reduce`], written to the key-value
/// store, and only then published. Transitions are serialized, so
/// concurrent callers never interleave a read-modify-write.
pub struct SessionStore<S>
where
    S: KeyValueStore,
{
    storage: S,
    login_policy: LoginPolicy,
    logout_scope: LogoutScope,
    notifier: Arc<dyn Notifier>,
    transition: Mutex<()>,
    session: watch::Sender<Session>,
}

/// Builder for [`SessionStore`].
pub struct SessionStoreBuilder<S>
where
    S: KeyValueStore,
{
    storage: S,
    login_policy: LoginPolicy,
    logout_scope: LogoutScope,
    notifier: Arc<dyn Notifier>,
}

impl<S> SessionStoreBuilder<S>
where
    S: KeyValueStore,
{
    #[must_use]
    pub const fn login_policy(mut self, policy: LoginPolicy) -> Self {
        self.login_policy = policy;
        self
    }

    #[must_use]
    pub const fn logout_scope(mut self, scope: LogoutScope) -> Self {
        self.logout_scope = scope;
        self
    }

    /// Where validation messages go. Defaults to [`TracingNotifier`].
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Rehydrate from storage and build the store.
    #[must_use]
    pub fn open(self) -> SessionStore<S> {
        let restored = rehydrate(&self.storage);
        let session = reduce(&Session::default(), SessionAction::Rehydrate(restored));
        tracing::debug!(?session, "session rehydrated");

        SessionStore {
            storage: self.storage,
            login_policy: self.login_policy,
            logout_scope: self.logout_scope,
            notifier: self.notifier,
            transition: Mutex::new(()),
            session: watch::Sender::new(session),
        }
    }
}

impl<S> SessionStore<S>
where
    S: KeyValueStore,
{
    /// Start building a store over `storage`.
    #[must_use]
    pub fn builder(storage: S) -> SessionStoreBuilder<S> {
        SessionStoreBuilder {
            storage,
            login_policy: LoginPolicy::default(),
            logout_scope: LogoutScope::default(),
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Open a store with default policies.
    #[must_use]
    pub fn open(storage: S) -> Self {
        Self::builder(storage).open()
    }

    /// Open a store with the policies from `config`.
    #[must_use]
    pub fn from_config(storage: S, config: &AppConfig) -> Self {
        Self::builder(storage)
            .login_policy(config.login_policy)
            .logout_scope(config.logout_scope)
            .open()
    }

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Receiver that is marked changed on every visible transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    #[must_use]
    pub const fn login_policy(&self) -> LoginPolicy {
        self.login_policy
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Authenticate `identifier`.
    ///
    /// Returns `Ok(false)` and notifies the user if the identifier is refused
    /// by the login policy; the session is left untouched.
    ///
    /// # Errors
    /// Returns error if the new session cannot be persisted.
    pub fn login(&self, identifier: &str) -> Result<bool, StoreError> {
        match self.login_policy.validate(identifier) {
            Ok(id) => {
                self.dispatch(SessionAction::Login(id.clone()))?;
                tracing::info!(login_id = %id, "logged in");
                Ok(true)
            }
            Err(rejection) => {
                tracing::debug!(identifier, %rejection, "login rejected");
                self.notifier.notify(&rejection.to_string());
                Ok(false)
            }
        }
    }

    /// Return to the anonymous session.
    ///
    /// With [`LogoutScope::AllKeys`] every key in storage is removed first.
    ///
    /// # Errors
    /// Returns error if storage cannot be cleared or written.
    pub fn logout(&self) -> Result<(), StoreError> {
        let wipe = self.logout_scope == LogoutScope::AllKeys;
        self.apply(SessionAction::Logout, wipe)?;
        tracing::info!(scope = ?self.logout_scope, "logged out");
        Ok(())
    }

    /// Replace the enriched profile.
    ///
    /// # Errors
    /// Returns error if the new session cannot be persisted.
    pub fn update_user(&self, user: Option<LoginUser>) -> Result<(), StoreError> {
        self.dispatch(SessionAction::UpdateUser(user)).map(drop)
    }

    /// Replace the selected album.
    ///
    /// # Errors
    /// Returns error if the new session cannot be persisted.
    pub fn update_album(&self, album: Option<Album>) -> Result<(), StoreError> {
        self.dispatch(SessionAction::UpdateAlbum(album)).map(drop)
    }

    fn dispatch(&self, action: SessionAction) -> Result<Session, StoreError> {
        self.apply(action, false)
    }

    fn apply(&self, action: SessionAction, wipe: bool) -> Result<Session, StoreError> {
        let _guard = self
            .transition
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.session.borrow().clone();
        let next = reduce(&current, action);

        let record = next.to_record().map_err(StorageError::from)?;
        if wipe {
            self.storage.clear()?;
        }
        match self.storage.set(SESSION_KEY, &record) {
            Ok(()) => {}
            // A cleared store already rehydrates to the anonymous session.
            Err(e) if wipe => {
                tracing::warn!("failed to rewrite session record after clear: {e}");
            }
            Err(e) => return Err(e.into()),
        }

        let changed = self.session.send_if_modified(|visible| {
            if *visible == next {
                false
            } else {
                *visible = next.clone();
                true
            }
        });
        tracing::debug!(changed, session = ?next, "session transition");

        Ok(next)
    }
}

/// Read the persisted session, falling back to the default on any problem.
fn rehydrate<S: KeyValueStore>(storage: &S) -> Session {
    match storage.get(SESSION_KEY) {
        Ok(Some(record)) => match Session::from_record(&record) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("corrupt session record, using default: {e}");
                write_default(storage);
                Session::default()
            }
        },
        Ok(None) => {
            write_default(storage);
            Session::default()
        }
        Err(e) => {
            tracing::warn!("failed to read session record, using default: {e}");
            Session::default()
        }
    }
}

fn write_default<S: KeyValueStore>(storage: &S) {
    let result = Session::default()
        .to_record()
        .map_err(StorageError::from)
        .and_then(|record| storage.set(SESSION_KEY, &record));
    if let Err(e) = result {
        tracing::warn!("failed to write default session record: {e}");
    }
}

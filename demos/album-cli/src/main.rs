//! Example command-line album browser.
//!
//! Run with: cargo run -p album-cli-demo -- <command>
//!
//! The session is kept in the configured storage file, so successive
//! invocations behave like page reloads:
//!
//! ```text
//! album-cli login 1
//! album-cli albums
//! album-cli select 3
//! album-cli photos
//! album-cli logout
//! ```

use std::sync::Arc;

use album_core::{Album, ApiEndpoints, AppConfig, HttpTransport, LoginUser, Notifier, Photo, User};
use album_fetch::{ActivationKey, FetchDescriptor, FetchResource, ReqwestTransport};
use album_session::{SessionStore, storage::FileStorage};
use anyhow::{Context, bail};
use serde::de::DeserializeOwned;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: album-cli <login <id> | whoami | users | albums | select <album-id> | photos | logout>";

/// Prints validation messages for the user.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

struct App {
    api: ApiEndpoints,
    store: SessionStore<FileStorage>,
    transport: Arc<dyn HttpTransport>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let storage = FileStorage::open(&config.storage_path)
        .with_context(|| format!("opening {}", config.storage_path.display()))?;
    let store = SessionStore::builder(storage)
        .login_policy(config.login_policy)
        .logout_scope(config.logout_scope)
        .notifier(Arc::new(ConsoleNotifier))
        .open();

    let app = App {
        api: ApiEndpoints::new(config.api_base_url.clone()),
        store,
        transport: Arc::new(ReqwestTransport::from_config(&config)?),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["login", id] => app.login(id).await,
        ["whoami"] => {
            app.whoami();
            Ok(())
        }
        ["users"] => app.users().await,
        ["albums"] => app.albums().await.map(drop),
        ["select", album_id] => app.select(album_id).await,
        ["photos"] => app.photos().await,
        ["logout"] => {
            app.store.logout()?;
            println!("logged out");
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

impl App {
    async fn login(&self, id: &str) -> anyhow::Result<()> {
        if !self.store.login(id)? {
            bail!("login refused");
        }

        let session = self.store.session();
        let login_id = session.login_id.clone();
        let user: Option<User> = fetch(
            &self.transport,
            FetchDescriptor::get(self.api.user(login_id.as_deref().unwrap_or_default()))
                .key(ActivationKey::new().with(login_id.clone()))
                .enabled(login_id.is_some()),
        )
        .await?;

        let user = user.context("user not found")?;
        self.store.update_user(Some(LoginUser::from(user)))?;
        self.whoami();
        Ok(())
    }

    fn whoami(&self) {
        let session = self.store.session();
        match (&session.login_id, &session.login_user) {
            (None, _) => println!("anonymous"),
            (Some(id), None) => println!("{id}"),
            (Some(_), Some(user)) => println!("{} {}", user.id, user.name),
        }
        if let Some(album) = &session.selected_album {
            println!("album: {}. {}", album.id, album.title);
        }
    }

    async fn users(&self) -> anyhow::Result<()> {
        let users: Vec<User> = fetch(
            &self.transport,
            FetchDescriptor::get(self.api.users()).default_data(Vec::new()),
        )
        .await?
        .unwrap_or_default();

        for user in users {
            println!("{}. {} ({})", user.id, user.name, user.username);
        }
        Ok(())
    }

    async fn albums(&self) -> anyhow::Result<Vec<Album>> {
        let session = self.store.session();
        let user_id = session.login_user.as_ref().map(|u| u.id);
        if user_id.is_none() {
            bail!("log in first");
        }

        let albums: Vec<Album> = fetch(
            &self.transport,
            FetchDescriptor::get(self.api.albums_by_user(user_id.unwrap_or_default()))
                .key(ActivationKey::new().with(user_id))
                .default_data(Vec::new())
                .enabled(user_id.is_some()),
        )
        .await?
        .unwrap_or_default();

        for album in &albums {
            println!("{}. {}", album.id, album.title);
        }
        Ok(albums)
    }

    async fn select(&self, album_id: &str) -> anyhow::Result<()> {
        let album_id: i64 = album_id.parse().context("album id must be a number")?;
        let album = self
            .albums()
            .await?
            .into_iter()
            .find(|a| a.id == album_id)
            .context("no such album for this user")?;

        println!("selected {}", album.title);
        self.store.update_album(Some(album))?;
        Ok(())
    }

    async fn photos(&self) -> anyhow::Result<()> {
        let session = self.store.session();
        let album = session.selected_album.context("select an album first")?;

        let photos: Vec<Photo> = fetch(
            &self.transport,
            FetchDescriptor::get(self.api.photos_by_album(album.id))
                .key(ActivationKey::new().with(album.id))
                .default_data(Vec::new()),
        )
        .await?
        .unwrap_or_default();

        println!("{}", album.title);
        for photo in photos {
            println!("  {} {}", photo.thumbnail_url, photo.title);
        }
        Ok(())
    }
}

/// Run a single evaluation to completion.
async fn fetch<T>(
    transport: &Arc<dyn HttpTransport>,
    descriptor: FetchDescriptor<T>,
) -> anyhow::Result<Option<T>>
where
    T: DeserializeOwned + Clone + PartialEq + Send + Sync + 'static,
{
    let mut resource = FetchResource::new(Arc::clone(transport));
    let mut state = resource.evaluate(descriptor);
    if state.loading {
        state = resource.settled().await;
    }

    if let Some(error) = state.error {
        bail!("request failed: {error}");
    }
    Ok(state.data)
}

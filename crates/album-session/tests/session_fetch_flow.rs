use std::{sync::Arc, time::Duration};

use album_core::{Album, ApiEndpoints, LoginUser, Photo, Session, User};
use album_fetch::{ActivationKey, FetchDescriptor, FetchResource, FetchState, testing::ScriptedTransport};
use album_session::{SessionStore, storage::MemoryStorage};
use serde_json::json;

fn user_descriptor(api: &ApiEndpoints, session: &Session) -> FetchDescriptor<User> {
    let login_id = session.login_id.clone();
    FetchDescriptor::get(api.user(login_id.as_deref().unwrap_or_default()))
        .key(ActivationKey::new().with(login_id.clone()))
        .enabled(login_id.is_some())
}

fn albums_descriptor(api: &ApiEndpoints, session: &Session) -> FetchDescriptor<Vec<Album>> {
    let user_id = session.login_user.as_ref().map(|u| u.id);
    FetchDescriptor::get(api.albums_by_user(user_id.unwrap_or_default()))
        .key(ActivationKey::new().with(user_id))
        .default_data(Vec::new())
        .enabled(user_id.is_some())
}

fn photos_descriptor(api: &ApiEndpoints, session: &Session) -> FetchDescriptor<Vec<Photo>> {
    let album_id = session.selected_album.as_ref().map(|a| a.id);
    FetchDescriptor::get(api.photos_by_album(album_id.unwrap_or_default()))
        .key(ActivationKey::new().with(album_id))
        .default_data(Vec::new())
        .enabled(album_id.is_some())
}

async fn settled<T: Clone + Send + Sync + 'static>(resource: &FetchResource<T>) -> FetchState<T> {
    tokio::time::timeout(Duration::from_secs(1), resource.settled())
        .await
        .expect("request never settled")
}

async fn flush_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn login_then_profile_enrichment() {
    let api = ApiEndpoints::default();
    let transport = Arc::new(ScriptedTransport::new());
    transport.json(
        api.user(5),
        200,
        json!({ "id": 5, "name": "Leanne Graham", "username": "Bret", "email": "Sincere@april.biz" }),
    );

    let store = SessionStore::open(MemoryStorage::new());
    let mut user_fetch = FetchResource::<User>::new(transport.clone());

    // Anonymous: nothing is requested.
    user_fetch.evaluate(user_descriptor(&api, &store.session()));
    flush_tasks().await;
    assert_eq!(transport.request_count(), 0);

    assert!(store.login("5").unwrap());
    assert_eq!(store.session().login_id.as_deref(), Some("5"));

    user_fetch.evaluate(user_descriptor(&api, &store.session()));
    let state = settled(&user_fetch).await;
    let user = state.data.expect("user fetched");
    store.update_user(Some(LoginUser::from(user))).unwrap();

    let session = store.session();
    assert_eq!(
        session.login_user.map(|u| u.name),
        Some("Leanne Graham".to_string())
    );
    assert_eq!(transport.requests()[0].url, api.user(5));
}

#[tokio::test]
async fn rapid_user_changes_only_show_latest_albums() {
    let api = ApiEndpoints::default();
    let transport = Arc::new(ScriptedTransport::new());
    let first = transport.gate(api.albums_by_user(1));
    let second = transport.gate(api.albums_by_user(2));

    let store = SessionStore::open(MemoryStorage::new());
    let mut albums_fetch = FetchResource::<Vec<Album>>::new(transport.clone());

    store.login("1").unwrap();
    store.update_user(Some(LoginUser::new(1, "Leanne Graham"))).unwrap();
    albums_fetch.evaluate(albums_descriptor(&api, &store.session()));
    flush_tasks().await;

    store.login("2").unwrap();
    store.update_user(Some(LoginUser::new(2, "Ervin Howell"))).unwrap();
    albums_fetch.evaluate(albums_descriptor(&api, &store.session()));
    flush_tasks().await;

    let user_two = vec![Album {
        user_id: 2,
        id: 11,
        title: "quam nostrum impedit mollitia quod et dolor".to_string(),
    }];
    second.json(200, json!(user_two));
    let state = settled(&albums_fetch).await;
    assert_eq!(state.data, Some(user_two.clone()));

    first.json(
        200,
        json!([{ "userId": 1, "id": 1, "title": "quidem molestiae enim" }]),
    );
    flush_tasks().await;
    assert_eq!(albums_fetch.state(), FetchState::idle(Some(user_two)));
}

#[tokio::test]
async fn album_selection_drives_photo_fetch_and_logout_resets() {
    let api = ApiEndpoints::default();
    let transport = Arc::new(ScriptedTransport::new());
    transport.json(
        api.photos_by_album(3),
        200,
        json!([{
            "albumId": 3,
            "id": 101,
            "title": "incidunt alias vel enim",
            "url": "https://via.placeholder.com/600/e743b",
            "thumbnailUrl": "https://via.placeholder.com/150/e743b"
        }]),
    );

    let store = SessionStore::open(MemoryStorage::new());
    let mut photos_fetch = FetchResource::<Vec<Photo>>::new(transport.clone());

    store.login("1").unwrap();
    store.update_user(Some(LoginUser::new(1, "Leanne Graham"))).unwrap();
    let state = photos_fetch.evaluate(photos_descriptor(&api, &store.session()));
    assert_eq!(state, FetchState::idle(Some(Vec::new())));

    store
        .update_album(Some(Album {
            user_id: 1,
            id: 3,
            title: "omnis laborum odio".to_string(),
        }))
        .unwrap();
    photos_fetch.evaluate(photos_descriptor(&api, &store.session()));
    let state = settled(&photos_fetch).await;
    assert_eq!(state.data.map(|p| p.len()), Some(1));

    store.logout().unwrap();
    assert_eq!(store.session(), Session::default());
    let state = photos_fetch.evaluate(photos_descriptor(&api, &store.session()));
    assert_eq!(state, FetchState::idle(Some(Vec::new())));
    assert_eq!(transport.request_count(), 1);
}

//! Pure session transitions.

use album_core::{Album, LoginUser, Session};

/// A requested session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Authenticate an already-validated identifier.
    Login(String),
    /// Return to the anonymous session.
    Logout,
    /// Replace the enriched profile.
    UpdateUser(Option<LoginUser>),
    /// Replace the selected album.
    UpdateAlbum(Option<Album>),
    /// Replace the whole session with a persisted one.
    Rehydrate(Session),
}

/// Compute the session that follows `action`.
///
/// Logging in as a different principal drops the previous principal's
/// profile and album selection.
#[must_use]
pub fn reduce(session: &Session, action: SessionAction) -> Session {
    match action {
        SessionAction::Login(id) => {
            if session.login_id.as_deref() == Some(id.as_str()) {
                session.clone()
            } else {
                Session {
                    login_id: Some(id),
                    ..Session::default()
                }
            }
        }
        SessionAction::Logout => Session::default(),
        SessionAction::UpdateUser(login_user) => Session {
            login_user,
            ..session.clone()
        },
        SessionAction::UpdateAlbum(selected_album) => Session {
            selected_album,
            ..session.clone()
        },
        SessionAction::Rehydrate(restored) => restored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: i64) -> Album {
        Album {
            user_id: 5,
            id,
            title: format!("album {id}"),
        }
    }

    fn authenticated() -> Session {
        Session {
            login_id: Some("5".to_string()),
            login_user: Some(LoginUser::new(5, "Chelsey Dietrich")),
            selected_album: Some(album(41)),
        }
    }

    #[test]
    fn test_login_from_anonymous() {
        let next = reduce(&Session::default(), SessionAction::Login("5".to_string()));
        assert_eq!(next.login_id.as_deref(), Some("5"));
        assert_eq!(next.login_user, None);
        assert_eq!(next.selected_album, None);
    }

    #[test]
    fn test_login_same_id_keeps_profile() {
        let session = authenticated();
        let next = reduce(&session, SessionAction::Login("5".to_string()));
        assert_eq!(next, session);
    }

    #[test]
    fn test_login_other_id_drops_stale_state() {
        let next = reduce(&authenticated(), SessionAction::Login("6".to_string()));
        assert_eq!(
            next,
            Session {
                login_id: Some("6".to_string()),
                ..Session::default()
            }
        );
    }

    #[test]
    fn test_full_state_machine() {
        let s = reduce(&Session::default(), SessionAction::Login("5".to_string()));
        let s = reduce(
            &s,
            SessionAction::UpdateUser(Some(LoginUser::new(5, "Chelsey Dietrich"))),
        );
        let s = reduce(&s, SessionAction::UpdateAlbum(Some(album(41))));
        assert_eq!(s, authenticated());

        assert_eq!(reduce(&s, SessionAction::Logout), Session::default());
    }

    #[test]
    fn test_updates_touch_only_their_field() {
        let session = authenticated();

        let next = reduce(&session, SessionAction::UpdateAlbum(None));
        assert_eq!(next.selected_album, None);
        assert_eq!(next.login_user, session.login_user);
        assert_eq!(next.login_id, session.login_id);

        let next = reduce(&session, SessionAction::UpdateUser(None));
        assert_eq!(next.login_user, None);
        assert_eq!(next.selected_album, session.selected_album);
    }

    #[test]
    fn test_rehydrate_replaces_everything() {
        let next = reduce(&Session::default(), SessionAction::Rehydrate(authenticated()));
        assert_eq!(next, authenticated());
    }
}

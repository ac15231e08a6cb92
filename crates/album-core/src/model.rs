//! Session aggregate and remote resource models.

use serde::{Deserialize, Serialize};

/// Profile of the authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: i64,
    pub name: String,
}

impl LoginUser {
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Album as returned by the remote album listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub user_id: i64,
    pub id: i64,
    pub title: String,
}

/// Photo as returned by the remote photo listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub album_id: i64,
    pub id: i64,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
}

/// User as returned by the user endpoints.
///
/// Only the fields the browser shows are kept; the rest of the payload
/// is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl From<User> for LoginUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
        }
    }
}

/// The persisted session.
///
/// `Session::default()` is the anonymous session. It is what readers see
/// before rehydration and after logout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier of the authenticated principal, `None` when anonymous.
    #[serde(rename = "loginId", default)]
    pub login_id: Option<String>,

    /// Profile fetched after login.
    #[serde(rename = "loginUser", default)]
    pub login_user: Option<LoginUser>,

    /// Last album the user drilled into.
    #[serde(rename = "album", default)]
    pub selected_album: Option<Album>,
}

impl Session {
    /// Whether a principal is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.login_id.is_some()
    }

    /// Encode to the durable record format.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_record(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode from the durable record format.
    ///
    /// # Errors
    /// Returns error if the record is malformed.
    pub fn from_record(record: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(record)
    }
}

//! Locators for the remote resources.

/// Default remote API.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Builds locator strings for the four remote resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiEndpoints {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List all users.
    #[must_use]
    pub fn users(&self) -> String {
        format!("{}/users", self.base_url)
    }

    /// Get a single user.
    #[must_use]
    pub fn user(&self, id: impl std::fmt::Display) -> String {
        format!("{}/users/{id}", self.base_url)
    }

    /// List albums owned by a user.
    #[must_use]
    pub fn albums_by_user(&self, user_id: i64) -> String {
        format!("{}/albums?userId={user_id}", self.base_url)
    }

    /// List photos in an album.
    #[must_use]
    pub fn photos_by_album(&self, album_id: i64) -> String {
        format!("{}/photos?albumId={album_id}", self.base_url)
    }
}

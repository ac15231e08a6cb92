//! Environment-driven configuration.

use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;

/// Configuration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Rule deciding which identifiers may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPolicy {
    /// Decimal identifier within `min..=max`.
    Range { min: u32, max: u32 },
    /// Any non-empty identifier.
    NonEmpty,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self::Range { min: 1, max: 10 }
    }
}

/// Why an identifier was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginRejection {
    #[error("Please enter an ID.")]
    Empty,
    #[error("Not a valid ID.")]
    Invalid,
}

impl LoginPolicy {
    /// Validate an identifier, returning its canonical form.
    ///
    /// Under a range policy the canonical form is the number without
    /// leading zeros; otherwise it is the trimmed input.
    ///
    /// # Errors
    /// Returns the rejection reason if the identifier is refused.
    pub fn validate(&self, identifier: &str) -> Result<String, LoginRejection> {
        let id = identifier.trim();
        if id.is_empty() {
            return Err(LoginRejection::Empty);
        }

        match *self {
            Self::NonEmpty => Ok(id.to_string()),
            Self::Range { min, max } => {
                if !id.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(LoginRejection::Invalid);
                }
                match id.parse::<u32>() {
                    Ok(n) if (min..=max).contains(&n) => Ok(n.to_string()),
                    _ => Err(LoginRejection::Invalid),
                }
            }
        }
    }
}

impl FromStr for LoginPolicy {
    type Err = ConfigError;

    /// Accepts `any` or `range:<min>-<max>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidValue {
            var: "ALBUM_LOGIN_POLICY",
            value: s.to_string(),
        };

        let s = s.trim();
        if s.eq_ignore_ascii_case("any") {
            return Ok(Self::NonEmpty);
        }

        let (min, max) = s
            .strip_prefix("range:")
            .and_then(|r| r.split_once('-'))
            .ok_or_else(invalid)?;
        let min = min.trim().parse().map_err(|_| invalid())?;
        let max = max.trim().parse().map_err(|_| invalid())?;
        if min > max {
            return Err(invalid());
        }
        Ok(Self::Range { min, max })
    }
}

/// What `logout` removes from durable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogoutScope {
    /// Reset only the session record.
    #[default]
    SessionKey,
    /// Wipe every key, then write the default session record.
    AllKeys,
}

impl FromStr for LogoutScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::SessionKey),
            "all" => Ok(Self::AllKeys),
            _ => Err(ConfigError::InvalidValue {
                var: "ALBUM_LOGOUT_SCOPE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the remote users/albums/photos API.
    pub api_base_url: String,

    /// File backing the durable key-value store.
    pub storage_path: PathBuf,

    /// Which identifiers `login` accepts.
    pub login_policy: LoginPolicy,

    /// What `logout` wipes.
    pub logout_scope: LogoutScope,

    /// Upper bound on a single remote request.
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            storage_path: default_storage_path(),
            login_policy: LoginPolicy::default(),
            logout_scope: LogoutScope::default(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ALBUM_API_URL") {
            config.api_base_url = url;
        }
        if let Some(path) = lookup("ALBUM_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(policy) = lookup("ALBUM_LOGIN_POLICY") {
            config.login_policy = policy.parse()?;
        }
        if let Some(scope) = lookup("ALBUM_LOGOUT_SCOPE") {
            config.logout_scope = scope.parse()?;
        }
        if let Some(secs) = lookup("ALBUM_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "ALBUM_REQUEST_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

/// Returns the default storage file path.
#[must_use]
pub fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("album-browser")
        .join("storage.json")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_range_policy() {
        let policy = LoginPolicy::default();
        for id in 1..=10 {
            let s = id.to_string();
            assert_eq!(policy.validate(&s), Ok(s.clone()));
        }
        assert_eq!(policy.validate(" 7 "), Ok("7".to_string()));
        assert_eq!(policy.validate("05"), Ok("5".to_string()));
        assert_eq!(policy.validate("0010"), Ok("10".to_string()));
        assert_eq!(policy.validate(""), Err(LoginRejection::Empty));
        assert_eq!(policy.validate("   "), Err(LoginRejection::Empty));
        for bad in ["0", "11", "-1", "+5", "abc", "5a", "1.5", "99999999999"] {
            assert_eq!(policy.validate(bad), Err(LoginRejection::Invalid), "{bad}");
        }
    }

    #[test]
    fn test_non_empty_policy() {
        let policy = LoginPolicy::NonEmpty;
        assert_eq!(policy.validate(" alice "), Ok("alice".to_string()));
        assert_eq!(policy.validate("042"), Ok("042".to_string()));
        assert_eq!(policy.validate(""), Err(LoginRejection::Empty));
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(LoginRejection::Empty.to_string(), "Please enter an ID.");
        assert_eq!(LoginRejection::Invalid.to_string(), "Not a valid ID.");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("any".parse(), Ok(LoginPolicy::NonEmpty));
        assert_eq!(
            "range:1-100".parse(),
            Ok(LoginPolicy::Range { min: 1, max: 100 })
        );
        assert!("range:10-1".parse::<LoginPolicy>().is_err());
        assert!("range:x-1".parse::<LoginPolicy>().is_err());
        assert!("numeric".parse::<LoginPolicy>().is_err());
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("session".parse(), Ok(LogoutScope::SessionKey));
        assert_eq!("ALL".parse(), Ok(LogoutScope::AllKeys));
        assert!("everything".parse::<LogoutScope>().is_err());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert!(config.storage_path.ends_with("album-browser/storage.json"));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ALBUM_API_URL", "http://localhost:3000"),
            ("ALBUM_STORAGE_PATH", "/tmp/album.json"),
            ("ALBUM_LOGIN_POLICY", "any"),
            ("ALBUM_LOGOUT_SCOPE", "all"),
            ("ALBUM_REQUEST_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.storage_path, PathBuf::from("/tmp/album.json"));
        assert_eq!(config.login_policy, LoginPolicy::NonEmpty);
        assert_eq!(config.logout_scope, LogoutScope::AllKeys);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_lookup_invalid_timeout() {
        let err = AppConfig::from_lookup(lookup(&[("ALBUM_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "ALBUM_REQUEST_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );
    }
}

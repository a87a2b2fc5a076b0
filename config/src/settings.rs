//! Typed console settings read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_APPROVAL_TTL_SECS: u64 = 900;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{key}: expected a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

/// Console settings.
///
/// | Env | Field | Default |
/// |-----|-------|---------|
/// | `WARDEN_API_URL` | `api_url` | `http://127.0.0.1:8787` |
/// | `WARDEN_APPROVAL_TTL_SECS` | `approval_ttl` | 900 s |
/// | `WARDEN_REQUEST_TIMEOUT_SECS` | `request_timeout` | 30 s |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub approval_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            approval_ttl: Duration::from_secs(DEFAULT_APPROVAL_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment. Call after [`crate::load_and_apply`].
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        if let Some(url) = lookup("WARDEN_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                return Err(SettingsError::Empty {
                    key: "WARDEN_API_URL",
                });
            }
            settings.api_url = url.to_string();
        }
        if let Some(v) = lookup("WARDEN_APPROVAL_TTL_SECS") {
            settings.approval_ttl = secs("WARDEN_APPROVAL_TTL_SECS", &v)?;
        }
        if let Some(v) = lookup("WARDEN_REQUEST_TIMEOUT_SECS") {
            settings.request_timeout = secs("WARDEN_REQUEST_TIMEOUT_SECS", &v)?;
        }
        Ok(settings)
    }
}

fn secs(key: &'static str, value: &str) -> Result<Duration, SettingsError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
        _ => Err(SettingsError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.approval_ttl, Duration::from_secs(900));
    }

    #[test]
    fn reads_overrides_and_trims_trailing_slash() {
        let s = Settings::from_lookup(lookup(&[
            ("WARDEN_API_URL", "https://gov.example/api/"),
            ("WARDEN_APPROVAL_TTL_SECS", "120"),
            ("WARDEN_REQUEST_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();
        assert_eq!(s.api_url, "https://gov.example/api");
        assert_eq!(s.approval_ttl, Duration::from_secs(120));
        assert_eq!(s.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err =
            Settings::from_lookup(lookup(&[("WARDEN_APPROVAL_TTL_SECS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidNumber {
                key: "WARDEN_APPROVAL_TTL_SECS",
                value: "soon".to_string()
            }
        );
        assert!(Settings::from_lookup(lookup(&[("WARDEN_REQUEST_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn empty_url_is_error() {
        let err = Settings::from_lookup(lookup(&[("WARDEN_API_URL", " / ")])).unwrap_err();
        assert_eq!(err, SettingsError::Empty { key: "WARDEN_API_URL" });
    }
}

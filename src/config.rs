//! Environment configuration for the DEQAR API tools.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE: &str = "https://backend.deqar.eu/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Username and password used to obtain a token when none is configured.
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// API settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in exactly one `/`
    pub base: String,
    pub token: Option<String>,
    pub login: Option<LoginCredentials>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset, like the shell wrappers did.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base = normalize_base(&get("DEQAR_BASE").unwrap_or_else(|| DEFAULT_BASE.to_string()))?;

        let token = get("DEQAR_TOKEN").map(|t| t.trim().to_string());

        let login = match (get("DEQAR_USER"), get("DEQAR_PASSWORD")) {
            (Some(username), Some(password)) => Some(LoginCredentials { username, password }),
            _ => None,
        };

        let timeout = match get("DEQAR_TIMEOUT") {
            Some(raw) => {
                let secs: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("DEQAR_TIMEOUT is not a number: {raw}")))?;
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(Error::Config(format!("DEQAR_TIMEOUT must be positive: {raw}")));
                }
                Duration::from_secs_f64(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            base,
            token,
            login,
            timeout,
        })
    }

    /// Config for a fixed base, no credentials.
    pub fn with_base(base: &str) -> Result<Self> {
        Ok(Self {
            base: normalize_base(base)?,
            token: None,
            login: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn url_for(&self, fragment: &str) -> String {
        join_url(&self.base, fragment)
    }
}

/// Validate a base URL and make it end in exactly one `/`.
pub fn normalize_base(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::Config(format!("DEQAR_BASE is not a valid URL ({e}): {trimmed}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::Config(format!(
            "DEQAR_BASE must be an http(s) URL: {trimmed}"
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::Config(format!(
            "DEQAR_BASE must not carry a query or fragment: {trimmed}"
        )));
    }
    Ok(format!("{}/", trimmed.trim_end_matches('/')))
}

/// Concatenate a normalized base with a route fragment.
pub fn join_url(base: &str, fragment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        fragment.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test_case("https://x.example", "https://x.example/" ; "adds slash")]
    #[test_case("https://x.example/", "https://x.example/" ; "keeps single slash")]
    #[test_case("https://x.example///", "https://x.example/" ; "collapses slashes")]
    #[test_case("http://localhost:8000/api", "http://localhost:8000/api/" ; "keeps path prefix")]
    fn test_normalize_base(raw: &str, expected: &str) {
        assert_eq!(normalize_base(raw).unwrap(), expected);
    }

    #[test_case("not a url" ; "garbage")]
    #[test_case("ftp://x.example/" ; "wrong scheme")]
    #[test_case("https://x.example/?a=1" ; "query")]
    fn test_normalize_base_rejects(raw: &str) {
        assert!(matches!(normalize_base(raw), Err(Error::Config(_))));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://x.example/", "/reports/1"),
            "https://x.example/reports/1"
        );
        assert_eq!(
            join_url("https://x.example/", "reports/1"),
            "https://x.example/reports/1"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base, DEFAULT_BASE);
        assert!(config.token.is_none());
        assert!(config.login.is_none());
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("DEQAR_BASE", "https://staging.deqar.example"),
            ("DEQAR_TOKEN", "abc123\n"),
            ("DEQAR_USER", "alice"),
            ("DEQAR_PASSWORD", "secret"),
            ("DEQAR_TIMEOUT", "2.5"),
        ]))
        .unwrap();
        assert_eq!(config.base, "https://staging.deqar.example/");
        assert_eq!(config.token.as_deref(), Some("abc123"));
        assert_eq!(config.login.as_ref().unwrap().username, "alice");
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_empty_token_is_unset() {
        let config = ApiConfig::from_lookup(lookup(&[("DEQAR_TOKEN", "")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_login_needs_both_values() {
        let config = ApiConfig::from_lookup(lookup(&[("DEQAR_USER", "alice")])).unwrap();
        assert!(config.login.is_none());
    }

    #[test]
    fn test_bad_timeout() {
        assert!(ApiConfig::from_lookup(lookup(&[("DEQAR_TIMEOUT", "soon")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("DEQAR_TIMEOUT", "0")])).is_err());
    }

    #[test]
    fn test_password_not_in_debug() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("DEQAR_USER", "alice"),
            ("DEQAR_PASSWORD", "secret"),
        ]))
        .unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}

use serde::Deserialize;

/// Base URL of the conference API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://sleepingpill.javazone.no";

/// Address the JSON API binds to when `LIBUM_BIND` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Environment variable holding the `user:pass` Basic-Auth credential.
pub const CREDENTIAL_ENV: &str = "MORESLEEP_BASIC_AUTH";

/// Environment variable overriding the upstream base URL.
pub const UPSTREAM_URL_ENV: &str = "LIBUM_UPSTREAM_URL";

/// Environment variable overriding the bind address.
pub const BIND_ADDR_ENV: &str = "LIBUM_BIND";

/// Environment variable naming the deployment environment.
pub const ENVIRONMENT_ENV: &str = "LIBUM_ENV";

/// Conferences served when neither the cache nor the upstream can answer.
/// Pairs of (slug, display name).
pub const BUILTIN_CONFERENCES: &[(&str, &str)] = &[
    ("javazone_2025", "JavaZone 2025"),
    ("javazone_2024", "JavaZone 2024"),
    ("javazone_2023", "JavaZone 2023"),
    ("javazone_2022", "JavaZone 2022"),
];

/// Top-level configuration for the service.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the upstream conference API, without trailing slash.
    pub upstream_url: String,
    /// Basic-Auth material in `user:pass` form.
    pub credential: Option<String>,
    /// Socket address for the JSON API.
    pub bind_addr: String,
    /// Free-form environment name (`development`, `production`, ...).
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            credential: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// Call `dotenv::dotenv()` first if a `.env` file should be honored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            upstream_url: get(UPSTREAM_URL_ENV)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_url),
            credential: get(CREDENTIAL_ENV),
            bind_addr: get(BIND_ADDR_ENV).unwrap_or(defaults.bind_addr),
            environment: get(ENVIRONMENT_ENV).unwrap_or(defaults.environment),
        }
    }

    /// Diagnostic summary of the credential that never reveals its value.
    pub fn credential_summary(&self) -> CredentialSummary {
        match &self.credential {
            Some(c) => CredentialSummary {
                set: true,
                length: c.len(),
                has_colon: c.contains(':'),
            },
            None => CredentialSummary::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CredentialSummary {
    pub set: bool,
    pub length: usize,
    pub has_colon: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.environment, "development");
        assert!(config.credential.is_none());
        assert!(!config.credential_summary().set);
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup(&[(CREDENTIAL_ENV, "   ")]));
        assert!(config.credential.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (CREDENTIAL_ENV, "user:secret"),
            (UPSTREAM_URL_ENV, "http://localhost:9000/"),
            (BIND_ADDR_ENV, "0.0.0.0:8080"),
        ]));
        assert_eq!(config.upstream_url, "http://localhost:9000");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(
            config.credential_summary(),
            CredentialSummary {
                set: true,
                length: 11,
                has_colon: true
            }
        );
    }
}

use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which analysis backend the service scores with.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Local,
    Remote { endpoint: String, api_key: String },
}

impl std::fmt::Debug for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Local => write!(f, "Local"),
            ProviderKind::Remote { endpoint, .. } => f
                .debug_struct("Remote")
                .field("endpoint", endpoint)
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub provider: ProviderKind,
    pub analysis_timeout: Duration,
    pub analysis_max_attempts: u32,
    pub analysis_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let provider = match lookup("ANALYSIS_PROVIDER").as_deref().unwrap_or("local") {
            "local" => ProviderKind::Local,
            "remote" => ProviderKind::Remote {
                endpoint: require("ANALYSIS_API_URL")?,
                api_key: require("ANALYSIS_API_KEY")?,
            },
            other => bail!("ANALYSIS_PROVIDER must be 'local' or 'remote', got '{other}'"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            provider,
            analysis_timeout: Duration::from_secs(
                parse_or(&lookup, "ANALYSIS_TIMEOUT_SECS", 30)
                    .context("ANALYSIS_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            analysis_max_attempts: parse_or(&lookup, "ANALYSIS_MAX_ATTEMPTS", 2)
                .context("ANALYSIS_MAX_ATTEMPTS must be a positive integer")?,
            analysis_concurrency: parse_or(&lookup, "ANALYSIS_CONCURRENCY", 4)
                .context("ANALYSIS_CONCURRENCY must be a positive integer")?,
            port: parse_or(&lookup, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => Ok(raw.trim().parse::<T>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_only_database_url() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/cv")]).unwrap();
        assert_eq!(config.provider, ProviderKind::Local);
        assert_eq!(config.analysis_timeout, Duration::from_secs(30));
        assert_eq!(config.analysis_max_attempts, 2);
        assert_eq!(config.analysis_concurrency, 4);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_missing_database_url_fails() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_remote_requires_credentials() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/cv"),
            ("ANALYSIS_PROVIDER", "remote"),
            ("ANALYSIS_API_URL", "https://analysis.example.com/v1/analyze"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_API_KEY"));
    }

    #[test]
    fn test_remote_config_redacts_key_in_debug() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/cv"),
            ("ANALYSIS_PROVIDER", "remote"),
            ("ANALYSIS_API_URL", "https://analysis.example.com/v1/analyze"),
            ("ANALYSIS_API_KEY", "sk-very-secret"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("analysis.example.com"));
        assert!(!debug.contains("sk-very-secret"));
    }

    #[test]
    fn test_unknown_provider_fails() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/cv"),
            ("ANALYSIS_PROVIDER", "magic"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_bad_port_fails() {
        let err = config_from(&[("DATABASE_URL", "postgres://localhost/cv"), ("PORT", "http")])
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}

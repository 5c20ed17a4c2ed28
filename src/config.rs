//! Application configuration
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file in the working directory.

use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_QUOTE_URL: &str = "https://api.kite.trade";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const APP_DIR_NAME: &str = "portfolio-tracker";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the SQLite database
    pub data_dir: PathBuf,
    /// Base URL of the quote provider
    pub quote_url: String,
    pub quote_api_key: Option<String>,
    pub access_token: Option<String>,
    /// Base URL of the persistence backend; local storage only when unset
    pub backend_url: Option<String>,
    /// Timeout applied to every outgoing HTTP request
    pub http_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from `.env` and the environment
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(AppError::Config(format!("Failed to read .env: {}", e)));
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match get("PORTFOLIO_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or_else(|| {
                    AppError::Config("Could not determine a data directory".to_string())
                })?,
        };

        let quote_url = get("PORTFOLIO_QUOTE_URL").unwrap_or_else(|| DEFAULT_QUOTE_URL.to_string());
        url::Url::parse(&quote_url)
            .map_err(|e| AppError::Config(format!("Invalid PORTFOLIO_QUOTE_URL: {}", e)))?;

        let backend_url = get("PORTFOLIO_BACKEND_URL");
        if let Some(ref backend) = backend_url {
            url::Url::parse(backend)
                .map_err(|e| AppError::Config(format!("Invalid PORTFOLIO_BACKEND_URL: {}", e)))?;
        }

        let http_timeout = match get("PORTFOLIO_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::Config(format!("Invalid PORTFOLIO_HTTP_TIMEOUT_SECS: {}", raw))
                })?;
                if secs == 0 {
                    return Err(AppError::Config(
                        "PORTFOLIO_HTTP_TIMEOUT_SECS must be positive".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            data_dir,
            quote_url: quote_url.trim_end_matches('/').to_string(),
            quote_api_key: get("PORTFOLIO_QUOTE_API_KEY"),
            access_token: get("PORTFOLIO_ACCESS_TOKEN"),
            backend_url: backend_url.map(|u| u.trim_end_matches('/').to_string()),
            http_timeout,
        })
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("portfolio.db")
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("PORTFOLIO_DATA_DIR", "/tmp/pt")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pt"));
        assert_eq!(config.quote_url, DEFAULT_QUOTE_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(config.backend_url.is_none());
        assert_eq!(config.database_path(), PathBuf::from("/tmp/pt/portfolio.db"));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORTFOLIO_DATA_DIR", "/data"),
            ("PORTFOLIO_QUOTE_URL", "https://quotes.example.com/"),
            ("PORTFOLIO_BACKEND_URL", "https://api.example.com/v1/"),
            ("PORTFOLIO_HTTP_TIMEOUT_SECS", "3"),
            ("PORTFOLIO_QUOTE_API_KEY", "key"),
        ]))
        .unwrap();

        assert_eq!(config.quote_url, "https://quotes.example.com");
        assert_eq!(config.backend_url.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.quote_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_timeout = AppConfig::from_lookup(lookup(&[
            ("PORTFOLIO_DATA_DIR", "/data"),
            ("PORTFOLIO_HTTP_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(bad_timeout, Err(AppError::Config(_))));

        let bad_url = AppConfig::from_lookup(lookup(&[
            ("PORTFOLIO_DATA_DIR", "/data"),
            ("PORTFOLIO_BACKEND_URL", "not a url"),
        ]));
        assert!(matches!(bad_url, Err(AppError::Config(_))));
    }
}

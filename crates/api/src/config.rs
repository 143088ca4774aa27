use std::env;
use std::fmt::Display;
use std::str::FromStr;

use axum::http::HeaderValue;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_DB_URL: &str = "sqlite://flashcards.sqlite3";
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {key} value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Server settings read from `FLASHCARDS_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub port: u16,
    /// CORS allow-origin; any origin when unset.
    pub allowed_origin: Option<HeaderValue>,
    pub sweep_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: None,
            sweep_on_start: false,
        }
    }
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for values that do not parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for values that do not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_url = lookup("FLASHCARDS_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                info!("FLASHCARDS_DB_URL not set, using default: {DEFAULT_DB_URL}");
                DEFAULT_DB_URL.to_string()
            });
        let port = try_load(&lookup, "FLASHCARDS_PORT", DEFAULT_PORT)?;
        let sweep_on_start = try_load(&lookup, "FLASHCARDS_SWEEP_ON_START", false)?;

        let allowed_origin = match lookup("FLASHCARDS_ALLOWED_ORIGIN") {
            Some(raw) => Some(HeaderValue::from_str(&raw).map_err(|e| ConfigError::Invalid {
                key: "FLASHCARDS_ALLOWED_ORIGIN",
                value: raw.clone(),
                reason: e.to_string(),
            })?),
            None => {
                info!("FLASHCARDS_ALLOWED_ORIGIN not set, allowing any origin");
                None
            }
        };

        Ok(Self {
            db_url,
            port,
            allowed_origin,
            sweep_on_start,
        })
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.port, 3001);
        assert!(config.allowed_origin.is_none());
        assert!(!config.sweep_on_start);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("FLASHCARDS_DB_URL", "sqlite://other.db"),
            ("FLASHCARDS_PORT", "8080"),
            ("FLASHCARDS_ALLOWED_ORIGIN", "http://localhost:3000"),
            ("FLASHCARDS_SWEEP_ON_START", "true"),
        ]))
        .unwrap();
        assert_eq!(config.db_url, "sqlite://other.db");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.allowed_origin.unwrap(),
            HeaderValue::from_static("http://localhost:3000")
        );
        assert!(config.sweep_on_start);
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("FLASHCARDS_PORT", "eighty")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "FLASHCARDS_PORT",
                ..
            }
        ));
        assert!(Config::from_lookup(lookup(&[("FLASHCARDS_SWEEP_ON_START", "yes")])).is_err());
    }
}

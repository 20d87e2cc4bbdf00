//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which collaborator implementation the server talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// The hosted Supabase project (auth + PostgREST).
    Supabase { url: String, anon_key: String },
    /// A process-local backend for development. Data is lost on restart.
    Memory,
}

/// Allowed CORS origins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub backend: StorageBackend,
    pub backend_timeout: Duration,
    pub cors_origins: CorsOrigins,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Backend Settings ---
        let backend = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "supabase".to_string())
            .to_lowercase()
            .as_str()
        {
            "supabase" => StorageBackend::Supabase {
                url: lookup("SUPABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("SUPABASE_URL".to_string()))?
                    .trim_end_matches('/')
                    .to_string(),
                anon_key: lookup("SUPABASE_ANON_KEY")
                    .ok_or_else(|| ConfigError::MissingVar("SUPABASE_ANON_KEY".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of supabase, memory", other),
                ))
            }
        };

        let timeout_secs = match lookup("SUPABASE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SUPABASE_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => 10,
        };

        // --- CORS ---
        let cors_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            None => CorsOrigins::Any,
            Some(raw) if raw.trim() == "*" => CorsOrigins::Any,
            Some(raw) => CorsOrigins::List(
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            ),
        };

        Ok(Self {
            bind_address,
            log_level,
            backend,
            backend_timeout: Duration::from_secs(timeout_secs),
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_with_supabase_credentials() {
        let config = load(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();

        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
        assert_eq!(config.cors_origins, CorsOrigins::Any);
        assert_eq!(
            config.backend,
            StorageBackend::Supabase {
                url: "https://demo.supabase.co".to_string(),
                anon_key: "anon".to_string()
            }
        );
    }

    #[test]
    fn supabase_requires_url() {
        let err = load(&[("SUPABASE_ANON_KEY", "anon")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(v) if v == "SUPABASE_URL"));
    }

    #[test]
    fn memory_backend_needs_no_credentials() {
        let config = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
    }

    #[test]
    fn rejects_unknown_backend_and_bad_address() {
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "redis")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "memory"), ("BIND_ADDRESS", "nope")]),
            Err(ConfigError::InvalidValue(..))
        ));
    }

    #[test]
    fn parses_origin_list() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://flipwise.app"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            CorsOrigins::List(vec![
                "http://localhost:3000".to_string(),
                "https://flipwise.app".to_string()
            ])
        );
    }
}

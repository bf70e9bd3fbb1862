//! Configuration module for the portfolio site.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Longest accepted admin session lifetime (ten years).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366 * 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {name} value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Hosted chat completion API settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the data service the client talks to
    pub api_url: String,
    /// Service key for privileged calls (optional in dev mode)
    pub service_key: Option<String>,
    /// Path to SQLite database file of the stand-in service
    pub db_path: PathBuf,
    /// Address to bind the stand-in service to
    pub bind_addr: SocketAddr,
    /// Lifetime of admin sessions
    pub session_ttl_hours: i64,
    pub chat: ChatConfig,
    /// Human contact channel named in chat fallback replies
    pub contact_email: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_addr_raw = var("SITE_BIND_ADDR", "127.0.0.1:8080");
        let bind_addr = bind_addr_raw
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "SITE_BIND_ADDR",
                value: bind_addr_raw.clone(),
                reason: e.to_string(),
            })?;

        let ttl_raw = var("SITE_SESSION_TTL_HOURS", "24");
        let session_ttl_hours = match ttl_raw.parse::<i64>() {
            Ok(hours) if hours > MAX_SESSION_TTL_HOURS => {
                return Err(ConfigError::Invalid {
                    name: "SITE_SESSION_TTL_HOURS",
                    value: ttl_raw,
                    reason: format!("must be at most {}", MAX_SESSION_TTL_HOURS),
                })
            }
            Ok(hours) if hours > 0 => hours,
            Ok(_) => {
                return Err(ConfigError::Invalid {
                    name: "SITE_SESSION_TTL_HOURS",
                    value: ttl_raw,
                    reason: "must be positive".to_string(),
                })
            }
            Err(e) => {
                return Err(ConfigError::Invalid {
                    name: "SITE_SESSION_TTL_HOURS",
                    value: ttl_raw,
                    reason: e.to_string(),
                })
            }
        };

        Ok(Self {
            api_url: var("SITE_API_URL", "http://127.0.0.1:8080"),
            service_key: optional("SITE_SERVICE_KEY"),
            db_path: var("SITE_DB_PATH", "./data/site.sqlite").into(),
            bind_addr,
            session_ttl_hours,
            chat: ChatConfig {
                api_url: var(
                    "SITE_CHAT_API_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                api_key: optional("SITE_CHAT_API_KEY"),
                model: var("SITE_CHAT_MODEL", "gemini-1.5-flash"),
            },
            contact_email: var("SITE_CONTACT_EMAIL", "hello@example.com"),
            log_level: var("SITE_LOG_LEVEL", "info"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]).unwrap();

        assert!(config.service_key.is_none());
        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert_eq!(config.db_path, PathBuf::from("./data/site.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.chat.model, "gemini-1.5-flash");
        assert!(config.chat.api_key.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SITE_SERVICE_KEY", "secret"),
            ("SITE_BIND_ADDR", "0.0.0.0:9000"),
            ("SITE_SESSION_TTL_HOURS", "2"),
            ("SITE_CONTACT_EMAIL", "team@studio.dev"),
        ])
        .unwrap();

        assert_eq!(config.service_key.as_deref(), Some("secret"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.session_ttl_hours, 2);
        assert_eq!(config.contact_email, "team@studio.dev");
    }

    #[test]
    fn test_blank_service_key_is_unset() {
        let config = config_from(&[("SITE_SERVICE_KEY", "  ")]).unwrap();
        assert!(config.service_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = config_from(&[("SITE_BIND_ADDR", "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SITE_BIND_ADDR", .. }));

        let err = config_from(&[("SITE_SESSION_TTL_HOURS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "SITE_SESSION_TTL_HOURS", .. }
        ));

        let err = config_from(&[("SITE_SESSION_TTL_HOURS", "9000000000000")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: "SITE_SESSION_TTL_HOURS", .. }
        ));

        let max = MAX_SESSION_TTL_HOURS.to_string();
        let config = config_from(&[("SITE_SESSION_TTL_HOURS", max.as_str())]).unwrap();
        assert_eq!(config.session_ttl_hours, MAX_SESSION_TTL_HOURS);
    }
}

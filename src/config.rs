// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `KEYS_DIR` | Directory of `<kid>.pem` signing keys | `zarf/keys` |
//! | `AUTH_ISSUER` | Issuer written into and required of tokens | `service` |
//! | `TOKEN_TTL_SECS` | Lifetime of issued tokens | `3600` |
//! | `SHUTDOWN_TIMEOUT_SECS` | Graceful shutdown budget | `20` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `SEED_ADMIN_EMAIL` | Email of an admin user created at startup | unset |
//! | `SEED_ADMIN_PASSWORD` | Password of the seeded admin | unset |

use std::path::PathBuf;
use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const KEYS_DIR_ENV: &str = "KEYS_DIR";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const SHUTDOWN_TIMEOUT_ENV: &str = "SHUTDOWN_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_KEYS_DIR: &str = "zarf/keys";
const DEFAULT_ISSUER: &str = "service";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 20;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credentials of the admin user seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub keys_dir: PathBuf,
    pub issuer: String,
    pub token_ttl: Duration,
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
    pub seed_admin: Option<SeedAdmin>,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get(PORT_ENV) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let token_ttl = parse_secs(get(TOKEN_TTL_ENV), TOKEN_TTL_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: TOKEN_TTL_ENV,
                expected: "a positive number of seconds",
                value: "0".to_string(),
            });
        }

        let shutdown_timeout = parse_secs(
            get(SHUTDOWN_TIMEOUT_ENV),
            SHUTDOWN_TIMEOUT_ENV,
            DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        )?;

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    expected: "'json' or 'pretty'",
                    value: other.to_string(),
                })
            }
        };

        let seed_admin = match (get(SEED_ADMIN_EMAIL_ENV), get(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    SEED_ADMIN_EMAIL_ENV,
                    SEED_ADMIN_PASSWORD_ENV,
                ))
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            keys_dir: get(KEYS_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYS_DIR)),
            issuer: get(AUTH_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            token_ttl,
            shutdown_timeout,
            log_format,
            seed_admin,
        })
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_secs(value: Option<String>, var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected: "a number of seconds",
                value,
            }),
        None => Ok(Duration::from_secs(default)),
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
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.keys_dir, PathBuf::from("zarf/keys"));
        assert_eq!(config.issuer, "service");
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(20));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.seed_admin.is_none());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = config_from(&[
            (PORT_ENV, "8080"),
            (KEYS_DIR_ENV, "/etc/keys"),
            (AUTH_ISSUER_ENV, "keygate"),
            (TOKEN_TTL_ENV, "60"),
            (LOG_FORMAT_ENV, "JSON"),
            (SEED_ADMIN_EMAIL_ENV, "admin@example.com"),
            (SEED_ADMIN_PASSWORD_ENV, "gophers"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.keys_dir, PathBuf::from("/etc/keys"));
        assert_eq!(config.issuer, "keygate");
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.seed_admin.unwrap().email, "admin@example.com");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[(PORT_ENV, "http")]),
            Err(ConfigError::Invalid { var: PORT_ENV, .. })
        ));
        assert!(matches!(
            config_from(&[(TOKEN_TTL_ENV, "0")]),
            Err(ConfigError::Invalid { var: TOKEN_TTL_ENV, .. })
        ));
        assert!(matches!(
            config_from(&[(LOG_FORMAT_ENV, "xml")]),
            Err(ConfigError::Invalid { var: LOG_FORMAT_ENV, .. })
        ));
        assert!(matches!(
            config_from(&[(SEED_ADMIN_EMAIL_ENV, "admin@example.com")]),
            Err(ConfigError::Incomplete(..))
        ));
    }

    #[test]
    fn seed_admin_debug_hides_password() {
        let seed = SeedAdmin {
            email: "admin@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{seed:?}").contains("hunter2"));
    }
}

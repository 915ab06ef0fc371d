use std::env;

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Credentials for the admin account created on startup.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    /// Reads the process environment. `.env` is expected to be loaded by the
    /// caller already.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let db_pool_size = parse_or(&lookup, "DB_POOL_SIZE", 10u32)?;
        if db_pool_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_POOL_SIZE",
                value: "0".to_string(),
            });
        }
        let ttl_hours = parse_or(&lookup, "SESSION_TTL_HOURS", 24i64)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }
        let cookie_secure = parse_or(&lookup, "COOKIE_SECURE", false)?;

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.trim().is_empty() => {
                Some(AdminBootstrap { email, password })
            }
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            db_pool_size,
            session_ttl: Duration::hours(ttl_hours),
            cookie_secure,
            admin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/shop")]).expect("config");

        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_pool_size, 10);
        assert_eq!(cfg.session_ttl, Duration::hours(24));
        assert!(!cfg.cookie_secure);
        assert!(cfg.admin.is_none());
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(
            config(&[]).expect_err("missing"),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")])
            .expect_err("bad port");
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn non_positive_session_ttl_is_rejected() {
        let err = config(&[("DATABASE_URL", "postgres://x"), ("SESSION_TTL_HOURS", "0")])
            .expect_err("bad ttl");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                ..
            }
        ));
    }

    #[test]
    fn admin_bootstrap_needs_both_variables() {
        let only_email = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_EMAIL", "root@example.com"),
        ])
        .expect("config");
        assert!(only_email.admin.is_none());

        let both = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "supersecret"),
            ("COOKIE_SECURE", "true"),
        ])
        .expect("config");
        assert_eq!(
            both.admin.map(|a| a.email).as_deref(),
            Some("root@example.com")
        );
        assert!(both.cookie_secure);
    }
}

use std::env;

use derive_more::{Display, Error};
use log::warn;
use uuid::Uuid;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "environment variable '{}' must be set", _0)]
    Missing(#[error(not(source))] &'static str),

    #[display(fmt = "environment variable '{}' has an invalid value '{}'", name, value)]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub app_env: AppEnv,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    ///
    /// `JWT_SECRET` is mandatory when `APP_ENV=production`; in development a
    /// random per-process secret stands in, so tokens do not survive a restart.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app_env = match non_empty("APP_ENV").as_deref() {
            None | Some("development") | Some("dev") => AppEnv::Development,
            Some("production") | Some("prod") => AppEnv::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "APP_ENV",
                    value: other.to_string(),
                })
            }
        };

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("PORT", non_empty("PORT"), DEFAULT_PORT)?;
        let max_connections = parse_or(
            "DB_MAX_CONNECTIONS",
            non_empty("DB_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;

        let jwt_secret = match (non_empty("JWT_SECRET"), app_env) {
            (Some(secret), _) => secret,
            (None, AppEnv::Production) => return Err(ConfigError::Missing("JWT_SECRET")),
            (None, AppEnv::Development) => {
                warn!("JWT_SECRET is not set, using an ephemeral development secret");
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            jwt_secret,
            app_env,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_in_development() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/events")])).unwrap();
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_connections, 5);
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn production_requires_jwt_secret() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/events"),
            ("APP_ENV", "production"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/events"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn production_uses_configured_secret() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/events"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cr3t"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_secret, "s3cr3t");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn development_secrets_differ_between_runs() {
        let vars = [("DATABASE_URL", "postgres://localhost/events")];
        let a = Config::from_lookup(lookup(&vars)).unwrap();
        let b = Config::from_lookup(lookup(&vars)).unwrap();
        assert_ne!(a.jwt_secret, b.jwt_secret);
    }

    #[test]
    fn database_url_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn bad_port_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/events"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn unknown_app_env_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/events"),
            ("APP_ENV", "staging"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "APP_ENV", .. }));
    }
}

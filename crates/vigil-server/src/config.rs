//! Runtime configuration read from the environment.
//!
//! `VIGIL_ENV` picks a profile (`FLASK_ENV` is accepted for deployments that
//! still set it). Each variable falls back to the profile's default.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-key-change-in-production";
pub const SERVICE_NAME: &str = "Healthcare Risk Platform API";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("JWT_SECRET_KEY must be set to a non-default value in {0}")]
    InsecureSecret(Environment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn requires_real_secret(&self) -> bool {
        matches!(self, Environment::Staging | Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub jwt_refresh_expiration_secs: i64,
    pub jwt_verify_exp: bool,
    pub cors_origins: Vec<String>,
    pub max_content_length: usize,
    pub password_hash_iterations: u32,
    pub log_level: String,
    pub log_format: LogFormat,
    pub feature_data_export: bool,
    pub data_retention_days: u32,
}

impl Config {
    /// Read from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("VIGIL_ENV").or_else(|| get("FLASK_ENV")) {
            Some(v) => v.parse()?,
            None => Environment::Development,
        };
        let testing = environment == Environment::Testing;

        let jwt_secret = get("JWT_SECRET_KEY").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());
        if environment.requires_real_secret() && jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureSecret(environment));
        }

        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::Json,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "LOG_FORMAT",
                        value: v,
                        reason: "expected json or pretty".to_string(),
                    });
                }
            },
        };

        let default_database = if testing { ":memory:" } else { "vigil.db" };
        let default_level = if environment == Environment::Development {
            "debug"
        } else {
            "info"
        };

        Ok(Self {
            environment,
            host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "API_PORT", 5000)?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| default_database.to_string()),
            jwt_secret,
            jwt_expiration_secs: positive_or(&get, "JWT_EXPIRATION", 3600)?,
            jwt_refresh_expiration_secs: positive_or(&get, "JWT_REFRESH_EXPIRATION", 2_592_000)?,
            jwt_verify_exp: parse_bool_or(&get, "JWT_VERIFY_EXP", !testing)?,
            cors_origins: get("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            max_content_length: parse_or(&get, "MAX_CONTENT_LENGTH", 16 * 1024 * 1024)?,
            password_hash_iterations: positive_or(
                &get,
                "PASSWORD_HASH_ITERATIONS",
                if testing {
                    1_000
                } else {
                    vigil_auth::password::DEFAULT_ITERATIONS
                },
            )?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| default_level.to_string()),
            log_format,
            feature_data_export: parse_bool_or(&get, "FEATURE_DATA_EXPORT", true)?,
            data_retention_days: parse_or(&get, "DATA_RETENTION_DAYS", 2555)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Like [`parse_or`], but zero and negative values are rejected too.
fn positive_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + fmt::Display,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool_or<G>(get: &G, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

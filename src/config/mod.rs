use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

// Top-level configuration, one section per concern
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub access: AccessConfig,
    pub sales: SalesConfig,
    pub cors: CorsConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

// Store connection. `url` wins over the individual parts; with neither the
// service falls back to the in-memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.host.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SalesConfig {
    /// `paymentStatus` value that, together with a client name, locks a ticket.
    pub paid_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_realtime: bool,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let access_code = get("ACCESS_CODE").ok_or(ConfigError::Missing("ACCESS_CODE"))?;

        Ok(Config {
            app: AppConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 3001)?,
                rust_log: get("RUST_LOG")
                    .unwrap_or_else(|| "raffle_tickets=debug,tower_http=debug".to_string()),
                log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Pretty)?,
            },
            database: DatabaseConfig {
                url: get("DATABASE_URL"),
                host: get("DB_HOST"),
                port: parse_or(&get, "DB_PORT", 5432)?,
                user: get("DB_USER"),
                // an empty password is legitimate for local servers
                password: lookup("DB_PASSWORD"),
                name: get("DB_NAME"),
                pool_size: parse_or(&get, "DB_POOL_SIZE", 10)?,
                acquire_timeout_secs: parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 30)?,
            },
            redis: RedisConfig {
                url: get("REDIS_URL"),
            },
            access: AccessConfig { code: access_code },
            sales: SalesConfig {
                paid_status: get("PAID_STATUS").unwrap_or_else(|| "Paid".to_string()),
            },
            cors: CorsConfig {
                allowed_origins: get("CORS_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            },
            features: FeatureFlags {
                enable_realtime: parse_or(&get, "ENABLE_REALTIME", true)?,
                broadcast_capacity: parse_or(&get, "BROADCAST_CAPACITY", 256)?,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

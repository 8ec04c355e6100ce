//! Process configuration, read once from the environment at startup.

use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use tracing::{info, warn};

const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub cors_origin: Option<String>,
    /// `None` runs against the in-memory store.
    pub mongo_uri: Option<String>,
    pub db_name: String,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub store_timeout: Duration,
    pub feed_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            cors_origin: None,
            mongo_uri: None,
            db_name: "voting".to_string(),
            jwt_secret: DEV_SECRET.to_string(),
            token_ttl: chrono::Duration::hours(720),
            bcrypt_cost: 10,
            store_timeout: Duration::from_millis(5000),
            feed_limit: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            DEV_SECRET.to_string()
        });

        let token_ttl_hours: i64 = try_load("TOKEN_TTL_HOURS", 720)?;
        let token_ttl = token_ttl(token_ttl_hours)?;
        let store_timeout_ms: u64 = try_load("STORE_TIMEOUT_MS", 5000)?;
        let bcrypt_cost: u32 = try_load("BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }

        Ok(Self {
            server_addr: try_load("SERVER_ADDR", defaults.server_addr)?,
            cors_origin: var("CORS_ORIGIN"),
            mongo_uri: var("MONGO_URI"),
            db_name: var("DB_NAME").unwrap_or(defaults.db_name),
            jwt_secret,
            token_ttl,
            bcrypt_cost,
            store_timeout: Duration::from_millis(store_timeout_ms),
            feed_limit: try_load("FEED_LIMIT", defaults.feed_limit)?,
        })
    }
}

fn token_ttl(hours: i64) -> Result<chrono::Duration, ConfigError> {
    chrono::Duration::try_hours(hours)
        .filter(|ttl| *ttl > chrono::Duration::zero())
        .ok_or_else(|| ConfigError::Invalid {
            key: "TOKEN_TTL_HOURS",
            value: hours.to_string(),
            reason: "must be a positive number of hours".to_string(),
        })
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;

use crate::cryptography::generate_secret_key;

const DEFAULT_PORT: &str = "8000";
const DEFAULT_MAX_CONNECTIONS: &str = "5";
const DEFAULT_BODY_LIMIT: &str = "10485760";
const GENERATED_SECRET_LENGTH: usize = 64;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub max_connections: u32,
    pub body_limit: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads every setting through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let secret_key = match lookup("FOODGRAM_SECRET_KEY").filter(|key| !key.is_empty()) {
            Some(key) => key,
            None => {
                log::warn!("FOODGRAM_SECRET_KEY not set, sessions will not survive a restart");
                generate_secret_key(GENERATED_SECRET_LENGTH)
            }
        };

        Ok(Self {
            port: try_load(&lookup, "FOODGRAM_PORT", DEFAULT_PORT)?,
            database_url,
            secret_key,
            max_connections: try_load(&lookup, "FOODGRAM_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            body_limit: try_load(&lookup, "FOODGRAM_BODY_LIMIT", DEFAULT_BODY_LIMIT)?,
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::AppError;

pub const DEFAULT_ORIGINS: &str = "https://www.bentsassistant.com,https://bents-model-backend.vercel.app";

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub relay_url: String,
    pub relay_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        let database_url = match read_secret("DATABASE_URL") {
            Some(url) => url,
            None => try_load("DATABASE_URL", "sqlite://bents.db")?,
        };

        let origins: String = try_load("ALLOWED_ORIGINS", DEFAULT_ORIGINS)?;

        Ok(Self {
            port: try_load("RUST_PORT", "5002")?,
            database_url,
            max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
            relay_url: try_load("RELAY_URL", "https://bents-model-phi.vercel.app")?,
            relay_timeout: Duration::from_secs(try_load("RELAY_TIMEOUT_SECS", "60")?),
            allowed_origins: split_origins(&origins),
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse::<T>()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Misconfigured {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret file ({e}), falling back to environment");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

fn split_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

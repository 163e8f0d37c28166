use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Entries kept by the media lookup cache, 0 disables it
    pub cache_capacity: usize,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigurationError(format!("{} must be a number, got '{}'", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", "sqlite://data/blockpress.db?mode=rwc"),
                max_connections: parsed_var("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port: parsed_var("SERVER_PORT", 3000)?,
            },
            media: MediaConfig {
                cache_capacity: parsed_var("MEDIA_CACHE_CAPACITY", 1000)?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

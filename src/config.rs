use std::{
    env,
    fmt::{self, Display},
};

use dotenvy::dotenv;

use crate::constants::{DEFAULT_MAX_CONNECTIONS, DEFAULT_SESSION_LIFETIME_HOURS};

#[derive(Debug)]
pub struct ConfigError {
    info: String,
}

impl ConfigError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error: {}", self.info)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub session_lifetime_hours: i64,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::new(format!("Missing environment variable '{name}'")))
        };

        let session_lifetime_hours = match lookup("SESSION_LIFETIME_HOURS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| ConfigError::new(format!("Invalid SESSION_LIFETIME_HOURS: {value}")))?,
            None => DEFAULT_SESSION_LIFETIME_HOURS,
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .map_err(|e| ConfigError::new(format!("Invalid DATABASE_MAX_CONNECTIONS: {e}")))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let config = Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            session_lifetime_hours,
            max_connections,
        };

        log::info!("Configuration loaded");
        Ok(config)
    }
}

//! Typed configuration from environment variables.
//!
//! Loads once at startup and fails fast on malformed values. The database
//! URL may carry credentials, so it is wrapped in `secrecy::SecretString`.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use crate::engine::MAX_TTR;
use crate::error::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://rebound.db";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TTR: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub max_connections: u32,
    pub listen_addr: SocketAddr,
    pub default_ttr: Duration,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let max_connections = match optional_var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("DATABASE_MAX_CONNECTIONS", &raw, "a positive integer"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let listen_addr = match optional_var("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| invalid("LISTEN_ADDR", &raw, "a socket address"))?,
            None => DEFAULT_LISTEN_ADDR
                .parse()
                .map_err(|_| Error::Config("bad built-in listen address".to_string()))?,
        };

        let default_ttr = match optional_var("DEFAULT_TTR") {
            Some(raw) => humantime::parse_duration(&raw)
                .ok()
                .filter(|d| !d.is_zero() && *d <= MAX_TTR)
                .ok_or_else(|| {
                    invalid("DEFAULT_TTR", &raw, "a positive duration of at most one year")
                })?,
            None => DEFAULT_TTR,
        };

        Ok(Self {
            database_url: SecretString::from(database_url),
            max_connections,
            listen_addr,
            default_ttr,
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Read a variable, treating unset and empty the same.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn invalid(name: &str, raw: &str, expected: &str) -> Error {
    Error::Config(format!("{name}={raw:?} is not {expected}"))
}

//! Server settings, read from the environment once at startup.

use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use log::LevelFilter;

pub const DEFAULT_TOKEN_DURATION: i64 = 3600;
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database the server keeps everything in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Lifetime of a bearer token in seconds.
    pub token_duration: i64,
    pub listen_addr: SocketAddr,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| anyhow!("$JWT_SECRET is not set"))?;

        let token_duration = match lookup("TOKEN_DURATION") {
            Some(value) => value
                .parse::<i64>()
                .context("$TOKEN_DURATION is not numeric")?,
            None => DEFAULT_TOKEN_DURATION,
        };
        if token_duration <= 0 {
            return Err(anyhow!("$TOKEN_DURATION must be positive"));
        }

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("$LISTEN_ADDR is not a socket address")?;

        let log_level = match lookup("LOG_LEVEL") {
            Some(level) => level
                .parse::<LevelFilter>()
                .context("$LOG_LEVEL is not a log level")?,
            None => LevelFilter::Debug,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            token_duration,
            listen_addr,
            log_level,
        })
    }
}

//! Service configuration loaded from environment variables
//!
//! - `PORT` - Server port number (default: 8080)
//! - `DATABASE_URL` - Path to the redb database file (default: "data.db")
//! - `STORE_BACKEND` - `redb` or `memory` (default: `redb`)
//! - `CODE_LENGTH` - Length of the first code candidates (default: 6)
//! - `MAX_CODE_LENGTH` - Longest generated code, at most 11 (default: 11)
//! - `ATTEMPTS_PER_LENGTH` - Collisions tolerated per length (default: 5)
//! - `ALLOCATION_TIMEOUT_MS` - Deadline for one allocation (default: 2000)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::allocator::AllocatorConfig;

/// Which [`LinkStore`](crate::store::LinkStore) implementation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(StoreBackend::Redb),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND `{other}`, expected `redb` or `memory`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub allocator: AllocatorConfig,
    pub allocation_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = AllocatorConfig::default();

        let allocator = AllocatorConfig {
            default_length: parse_var("CODE_LENGTH", defaults.default_length)?,
            max_length: parse_var("MAX_CODE_LENGTH", defaults.max_length)?,
            attempts_per_length: parse_var("ATTEMPTS_PER_LENGTH", defaults.attempts_per_length)?,
        };
        allocator
            .validate()
            .context("invalid code allocator settings")?;

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string()),
            store_backend: parse_var("STORE_BACKEND", StoreBackend::Redb)?,
            allocator,
            allocation_timeout: Duration::from_millis(parse_var("ALLOCATION_TIMEOUT_MS", 2000)?),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

//! Process configuration read from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use greengrocer_auth::HashCost;
use thiserror::Error;

pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "HOST";
pub const SECRET_KEY_ENV: &str = "SECRET_KEY";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const FREE_EMAIL_DOMAINS_PATH_ENV: &str = "FREE_EMAIL_DOMAINS_PATH";
pub const ARGON2_MEMORY_KIB_ENV: &str = "ARGON2_MEMORY_KIB";
pub const ARGON2_ITERATIONS_ENV: &str = "ARGON2_ITERATIONS";
pub const ARGON2_PARALLELISM_ENV: &str = "ARGON2_PARALLELISM";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub secret_key: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// `None` selects the bundled free-email domain list.
    pub free_email_domains_path: Option<PathBuf>,
    pub hash_cost: HashCost,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("free_email_domains_path", &self.free_email_domains_path)
            .field("hash_cost", &self.hash_cost)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var(PORT_ENV) {
            Some(v) => parse(PORT_ENV, "a port number", &v)?,
            None => DEFAULT_PORT,
        };
        let host = match var(HOST_ENV) {
            Some(v) => parse(HOST_ENV, "an IP address", &v)?,
            None => parse(HOST_ENV, "an IP address", DEFAULT_HOST)?,
        };

        let secret_key = var(SECRET_KEY_ENV).unwrap_or_else(|| {
            tracing::warn!("{SECRET_KEY_ENV} not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let defaults = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: optional(&var, ARGON2_MEMORY_KIB_ENV)?.unwrap_or(defaults.memory_kib),
            iterations: optional(&var, ARGON2_ITERATIONS_ENV)?.unwrap_or(defaults.iterations),
            parallelism: optional(&var, ARGON2_PARALLELISM_ENV)?.unwrap_or(defaults.parallelism),
        };

        Ok(Self {
            host,
            port,
            secret_key,
            database_url: var(DATABASE_URL_ENV),
            free_email_domains_path: var(FREE_EMAIL_DOMAINS_PATH_ENV).map(PathBuf::from),
            hash_cost,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, expected: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    })
}

fn optional(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<u32>, ConfigError> {
    var(name).map(|v| parse(name, "a positive integer", &v)).transpose()
}

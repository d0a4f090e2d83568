//! Application configuration management

use std::env;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_PATH: &str = "./data/shelfie.db";
const DEFAULT_RATINGS_DATABASE_PATH: &str = "./data/shelfie-ratings.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (for generating URLs)
    pub host: Option<String>,

    /// Server port
    pub port: u16,

    /// Catalog database URL or path
    pub database_url: String,

    /// Rating document store URL or path
    pub ratings_database_url: String,

    /// Pool size for each store
    pub max_connections: u32,

    /// JWT secret for token verification. Without it bearer tokens are
    /// ignored.
    pub jwt_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = lookup("DATABASE_PATH")
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let ratings_database_url = lookup("RATINGS_DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_RATINGS_DATABASE_PATH.to_string());

        let port = match lookup("PORT") {
            Some(port) => port.parse().context("Invalid PORT")?,
            None => DEFAULT_PORT,
        };

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Ok(Self {
            host: lookup("HOST"),
            port,
            database_url,
            ratings_database_url,
            max_connections,
            jwt_secret: lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()),
        })
    }

    /// Public base URL of the server, `localhost` when no host is set
    pub fn public_url(&self) -> String {
        format!("http://{}:{}", self.host.as_deref().unwrap_or("localhost"), self.port)
    }
}

// src/config.rs

use std::{env, fmt};

const DEFAULT_JWT_EXPIRATION_SECS: u64 = 60 * 60 * 24;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When absent the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub log_dir: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// JSON file with questions inserted when the question store is empty.
    pub seed_questions: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = optional("DATABASE_URL");

        let jwt_secret = optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = parse_or("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION_SECS)?;

        let rust_log = optional("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let log_dir = optional("LOG_DIR").unwrap_or_else(|| "logs".to_string());

        let port = parse_or("PORT", DEFAULT_PORT)?;

        let cors_origins = optional("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let seed_questions = optional("SEED_QUESTIONS");

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            log_dir,
            port,
            cors_origins,
            seed_questions,
        })
    }

    /// Configuration for tests and local tooling: in-memory store, no seeding.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            log_dir: "logs".to_string(),
            port: 0,
            cors_origins: Vec::new(),
            seed_questions: None,
        }
    }
}

/// Reads a variable, treating empty values as unset.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

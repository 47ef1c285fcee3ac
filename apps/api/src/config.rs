use anyhow::{bail, Context, Result};

/// Which persistence backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub superuser_email: Option<String>,
    pub superuser_password: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend = match optional_env("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        let database_url = match storage_backend {
            StorageBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StorageBackend::Memory => optional_env("DATABASE_URL"),
        };

        Ok(Config {
            storage_backend,
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: require_env("JWT_SECRET")?,
            access_token_ttl_minutes: parse_env("ACCESS_TOKEN_TTL_MINUTES", 5)?,
            refresh_token_ttl_days: parse_env("REFRESH_TOKEN_TTL_DAYS", 1)?,
            superuser_email: optional_env("SUPERUSER_EMAIL"),
            superuser_password: optional_env("SUPERUSER_PASSWORD"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Configuration used by handler tests: in-memory store, fixed secret.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            storage_backend: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_minutes: 5,
            refresh_token_ttl_days: 1,
            superuser_email: None,
            superuser_password: None,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

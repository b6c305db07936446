//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `STORE_BACKEND` - `postgres` (default) or `memory`
//! - `DATABASE_URL` - PostgreSQL connection string (required for `postgres`)
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 10)
//! - `HOST` - bind address (default: 0.0.0.0)
//! - `PORT` - listen port (default: 8080)
//! - `JWT_SECRET` - token signing secret
//! - `JWT_TTL_HOURS` - token lifetime (default: 168)
//! - `UPLOAD_DIR` - where product images are written (default: uploads)
//! - `PUBLIC_BASE_URL` - absolute URL prefix for image links; defaults to the request's `Host`
//! - `SEED_SAMPLE_DATA` - create the admin account and sample catalog on startup (default: true)
//! - `ADMIN_NAME`, `ADMIN_EMAIL`, `ADMIN_PASSWORD` - seeded admin account

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-only-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend `{other}`")),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: PathBuf,
    pub public_base_url: Option<String>,
    pub seed_sample_data: bool,
    pub admin: AdminAccount,
}

/// Account created by startup seeding when it does not exist yet.
#[derive(Clone)]
pub struct AdminAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_hours: 168,
            upload_dir: PathBuf::from("uploads"),
            public_base_url: None,
            seed_sample_data: true,
            admin: AdminAccount {
                name: "Admin User".to_string(),
                email: "admin@shopeasy.com".to_string(),
                password: "admin123".to_string(),
            },
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("store_backend", &self.store_backend)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("upload_dir", &self.upload_dir)
            .field("public_base_url", &self.public_base_url)
            .field("seed_sample_data", &self.seed_sample_data)
            .field("admin_email", &self.admin.email)
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let store_backend: StoreBackend = parse_env_or("STORE_BACKEND", StoreBackend::Postgres)?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            store_backend,
            database_url,
            max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            host: parse_env_or("HOST", defaults.host)?,
            port: parse_env_or("PORT", defaults.port)?,
            jwt_secret,
            jwt_ttl_hours: parse_env_or("JWT_TTL_HOURS", defaults.jwt_ttl_hours)?,
            upload_dir: std::env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            public_base_url: std::env::var("PUBLIC_BASE_URL").ok().filter(|s| !s.is_empty()),
            seed_sample_data: parse_env_or("SEED_SAMPLE_DATA", defaults.seed_sample_data)?,
            admin: AdminAccount {
                name: std::env::var("ADMIN_NAME").unwrap_or(defaults.admin.name),
                email: std::env::var("ADMIN_EMAIL").unwrap_or(defaults.admin.email),
                password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
            },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config { database_url: Some("postgres://u:pw@db/shop".into()), ..Config::default() };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("pw@db"));
        assert!(!rendered.contains(DEV_JWT_SECRET));
    }

    #[test]
    fn test_parse_env_or_uses_default_for_unset_key() {
        let port: u16 = parse_env_or("STOREFRONT_TEST_UNSET_PORT_KEY", 4321).unwrap();
        assert_eq!(port, 4321);
    }
}

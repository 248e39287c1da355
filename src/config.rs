use std::net::{IpAddr, Ipv4Addr};

use thiserror::Error;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BOM_MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Credentials for the admin account created at startup when none exists.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
    pub bom_max_depth: usize,
    pub log_level: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let host = parse_or(get("HOST"), "HOST", DEFAULT_HOST)?;
        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let jwt_expiry_hours = parse_or(get("JWT_EXPIRY_HOURS"), "JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS)?;
        let db_max_connections = parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        let bom_max_depth = parse_or(get("BOM_MAX_DEPTH"), "BOM_MAX_DEPTH", DEFAULT_BOM_MAX_DEPTH)?;

        if jwt_expiry_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_HOURS",
                value: jwt_expiry_hours.to_string(),
            });
        }
        if bom_max_depth == 0 {
            return Err(ConfigError::Invalid { key: "BOM_MAX_DEPTH", value: "0".into() });
        }

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            jwt_secret,
            jwt_expiry_hours,
            cors_origin: get("CORS_ORIGIN").filter(|o| o != "*"),
            bom_max_depth,
            log_level: get("LOG_LEVEL"),
            admin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

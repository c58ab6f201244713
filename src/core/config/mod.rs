use anyhow::Context;
use log::warn;
use std::env;
use std::str::FromStr;

use crate::security::Argon2Config;

const DEV_JWT_SECRET: &str = "progresso-dev-secret-change-in-production";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub seed_fallback_data: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub run_migrations: bool,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub password_min_length: usize,
    pub argon2: Argon2Config,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connect_timeout_secs: 5,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            run_migrations: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiry_hours: 24,
            password_min_length: 6,
            argon2: Argon2Config::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                environment: "development".to_string(),
                cors_allowed_origins: Vec::new(),
            },
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            seed_fallback_data: true,
        }
    }
}

impl AppConfig {
    /// Reads the process environment (after `.env`) on top of the defaults.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set, using default development secret - DO NOT USE IN PRODUCTION");
                defaults.auth.jwt_secret.clone()
            }
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(AppConfig {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: env_or("PORT", defaults.server.port)?,
                environment: env::var("APP_ENV").unwrap_or(defaults.server.environment),
                cors_allowed_origins,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT_SECS",
                    defaults.database.connect_timeout_secs,
                )?,
                retry_attempts: env_or("DATABASE_RETRY_ATTEMPTS", defaults.database.retry_attempts)?,
                retry_delay_ms: env_or("DATABASE_RETRY_DELAY_MS", defaults.database.retry_delay_ms)?,
                run_migrations: env_flag("DATABASE_RUN_MIGRATIONS", defaults.database.run_migrations)?,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_hours: env_or("JWT_EXPIRY_HOURS", defaults.auth.jwt_expiry_hours)?,
                password_min_length: env_or(
                    "PASSWORD_MIN_LENGTH",
                    defaults.auth.password_min_length,
                )?,
                argon2: defaults.auth.argon2,
            },
            seed_fallback_data: env_flag("SEED_FALLBACK_DATA", defaults.seed_fallback_data)?,
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.server.environment.as_str(), "production" | "prod")
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool, anyhow::Error> {
    match env::var(key) {
        Ok(raw) => parse_flag(&raw).with_context(|| format!("Invalid boolean for {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

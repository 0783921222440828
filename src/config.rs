use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting; 0 disables a limiter
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,
    pub rate_import_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: String,

    pub settings_cache_ttl_secs: u64,
    pub leave_restore_on_cancel: bool,
    pub import_max_bytes: usize,
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_import_per_min: parsed("RATE_IMPORT_PER_MIN", 10)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            settings_cache_ttl_secs: parsed("SETTINGS_CACHE_TTL_SECS", 60)?,
            leave_restore_on_cancel: parsed("LEAVE_RESTORE_ON_CANCEL", false)?,
            import_max_bytes: parsed("IMPORT_MAX_BYTES", 2 * 1024 * 1024)?,
        })
    }
}

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub parley_env: String,
    pub api_bind: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub upload_dir: PathBuf,
    pub upload_url_prefix: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source so tests never touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("PARLEY_DATABASE_URL"))
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL or PARLEY_DATABASE_URL"))?;
        let parley_env = lookup("PARLEY_ENV").unwrap_or_else(|| "development".to_string());
        let api_bind = lookup("PARLEY_API_BIND").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let db_max_connections = parse_or(&lookup, "PARLEY_DB_MAX_CONNECTIONS", 10)?;
        let run_migrations = parse_bool_or(&lookup, "PARLEY_RUN_MIGRATIONS", true)?;
        let upload_dir = lookup("PARLEY_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("public/uploads"));
        let upload_url_prefix = normalize_prefix(
            lookup("PARLEY_UPLOAD_URL_PREFIX").unwrap_or_else(|| "/uploads".to_string()),
        )?;

        Ok(Self {
            database_url,
            parley_env,
            api_bind,
            db_max_connections,
            run_migrations,
            upload_dir,
            upload_url_prefix,
        })
    }
}

/// Application credentials for the hosted chat SDK. Never defaulted.
#[derive(Clone, Deserialize)]
pub struct VendorCredentials {
    pub app_id: String,
    pub access_token: String,
}

impl VendorCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_id = lookup("PARLEY_VENDOR_APP_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("PARLEY_VENDOR_APP_ID"))?;
        let access_token = lookup("PARLEY_VENDOR_ACCESS_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("PARLEY_VENDOR_ACCESS_TOKEN"))?;
        Ok(Self {
            app_id,
            access_token,
        })
    }
}

impl fmt::Debug for VendorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorCredentials")
            .field("app_id", &self.app_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        None => Ok(default),
    }
}

fn normalize_prefix(prefix: String) -> Result<String, ConfigError> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') || trimmed.len() < 2 {
        return Err(ConfigError::Invalid {
            key: "PARLEY_UPLOAD_URL_PREFIX",
            value: prefix,
        });
    }
    Ok(trimmed.to_string())
}

// app/src/config.rs

use bookstore::{SeedConfig, DEFAULT_SESSION_TTL_SECS};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!(
        "Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Without a database URL the server keeps everything in memory.
  pub database_url: Option<String>,
  pub database_max_connections: u32,

  pub session_cookie_name: String,
  pub session_cookie_secure: bool,
  /// Idle seconds before a stored session expires.
  pub session_ttl_secs: u64,
  pub session_purge_interval_secs: u64,

  pub seed_db: bool,
  pub staff_username: String,
  pub staff_email: String,
  pub staff_password: String,

  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      database_max_connections: 5,
      session_cookie_name: "bookstore_session".to_string(),
      session_cookie_secure: false,
      session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
      session_purge_interval_secs: 60 * 60,
      seed_db: false,
      staff_username: "admin".to_string(),
      staff_email: "admin@example.com".to_string(),
      staff_password: "admin".to_string(),
      log_format: LogFormat::Pretty,
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let defaults = Self::default();

    let get_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());
    let env_or = |var_name: &str, default: String| get_env(var_name).unwrap_or(default);

    let server_host = env_or("SERVER_HOST", defaults.server_host);
    let server_port = env_or("SERVER_PORT", defaults.server_port.to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL");
    let database_max_connections = env_or("DATABASE_MAX_CONNECTIONS", defaults.database_max_connections.to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e)))?;

    let session_cookie_name = env_or("SESSION_COOKIE_NAME", defaults.session_cookie_name);
    let session_cookie_secure = env_or("SESSION_COOKIE_SECURE", "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SESSION_COOKIE_SECURE value: {}", e)))?;
    let session_ttl_secs = parse_positive(
      "SESSION_TTL_SECONDS",
      env_or("SESSION_TTL_SECONDS", defaults.session_ttl_secs.to_string()),
    )?;
    let session_purge_interval_secs = parse_positive(
      "SESSION_PURGE_INTERVAL_SECONDS",
      env_or("SESSION_PURGE_INTERVAL_SECONDS", defaults.session_purge_interval_secs.to_string()),
    )?;

    let seed_db = env_or("SEED_DB", "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;
    let staff_username = env_or("STAFF_USERNAME", defaults.staff_username);
    let staff_email = env_or("STAFF_EMAIL", defaults.staff_email);
    let staff_password = env_or("STAFF_PASSWORD", defaults.staff_password);

    let log_format = env_or("LOG_FORMAT", "pretty".to_string()).parse::<LogFormat>()?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      session_cookie_name,
      session_cookie_secure,
      session_ttl_secs,
      session_purge_interval_secs,
      seed_db,
      staff_username,
      staff_email,
      staff_password,
      log_format,
    })
  }

  pub fn seed_config(&self) -> SeedConfig {
    SeedConfig {
      staff_username: self.staff_username.clone(),
      staff_email: self.staff_email.clone(),
      staff_password: self.staff_password.clone(),
    }
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_positive(var_name: &str, raw: String) -> Result<u64> {
  match raw.trim().parse::<u64>() {
    Ok(0) => Err(AppError::Config(format!("{} must be greater than zero", var_name))),
    Ok(value) => Ok(value),
    Err(e) => Err(AppError::Config(format!("Invalid {}: {}", var_name, e))),
  }
}

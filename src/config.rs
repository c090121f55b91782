//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (including
//! `.env`) > built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ==================== Defaults ====================

/// Console URL registered as the default service
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3000/manage";

pub const DEFAULT_DATABASE_PATH: &str = "data/services.db";

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Admin session lifetime in hours
pub const DEFAULT_SESSION_HOURS: i64 = 8;

// ==================== config.toml ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
  management: Option<ManagementSection>,
  database: Option<DatabaseSection>,
  server: Option<ServerSection>,
}

#[derive(Debug, Deserialize)]
struct ManagementSection {
  default_service_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
  path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
  port: Option<u16>,
  session_hours: Option<i64>,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
  /// The console's own service URL, kept registered at all times
  pub default_service_url: String,
  pub database_path: PathBuf,
  pub port: u16,
  pub session_hours: i64,
}

impl AdminConfig {
  /// Load from ./config.toml and the process environment
  pub fn load() -> Self {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = read_config_file(Path::new("config.toml"));
    Self::resolve(file, |key| std::env::var(key).ok())
  }

  /// Merge the config file with environment lookups
  pub fn resolve(file: Option<FileConfig>, env: impl Fn(&str) -> Option<String>) -> Self {
    let file = file.unwrap_or_default();

    let default_service_url = file
      .management
      .and_then(|m| m.default_service_url)
      .or_else(|| env("DEFAULT_SERVICE_URL"))
      .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

    let database_path = file
      .database
      .and_then(|d| d.path)
      .or_else(|| env("DATABASE_PATH"))
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

    let (file_port, file_session_hours) = match file.server {
      Some(server) => (server.port, server.session_hours),
      None => (None, None),
    };

    let port = file_port
      .or_else(|| env("PORT").and_then(|p| parse_or_warn("PORT", &p)))
      .unwrap_or(DEFAULT_SERVER_PORT);

    let session_hours = file_session_hours
      .or_else(|| env("SESSION_HOURS").and_then(|h| parse_or_warn("SESSION_HOURS", &h)))
      .unwrap_or(DEFAULT_SESSION_HOURS);

    tracing::info!("Default service URL: {}", default_service_url);
    tracing::info!("Using database: {}", database_path.display());

    Self {
      default_service_url,
      database_path,
      port,
      session_hours,
    }
  }

  /// Get the full server bind address
  pub fn bind_addr(&self) -> String {
    format!("{}:{}", SERVER_ADDR, self.port)
  }
}

/// Read and parse a config file, logging (not failing) on bad contents
pub fn read_config_file(path: &Path) -> Option<FileConfig> {
  let contents = std::fs::read_to_string(path).ok()?;
  match toml::from_str::<FileConfig>(&contents) {
    Ok(config) => Some(config),
    Err(e) => {
      tracing::warn!("Ignoring invalid {}: {}", path.display(), e);
      None
    }
  }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
  match value.parse() {
    Ok(v) => Some(v),
    Err(_) => {
      tracing::warn!("Ignoring invalid {} value: {}", key, value);
      None
    }
  }
}

//! Versioned schema for services.db.
//!
//! Each migration runs exactly once, gated on the highest version recorded
//! in `db_version`.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Bootstrap: ensure db_version table exists (needed to check version)
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    );
    "#,
  )?;

  let current_version = get_schema_version(conn)?;
  tracing::debug!("services.db schema version: {}", current_version);

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }

  Ok(())
}

/// v0→v1: registered services and admin sessions
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v0→v1: Create base tables");

  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS registered_services (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      service_id TEXT NOT NULL,
      name TEXT NOT NULL,
      description TEXT,
      theme TEXT,
      evaluation_order INTEGER NOT NULL DEFAULT 0,
      enabled INTEGER NOT NULL DEFAULT 1,
      sso_enabled INTEGER NOT NULL DEFAULT 1,
      anonymous_access INTEGER NOT NULL DEFAULT 0,
      allowed_to_proxy INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS sessions (
      id TEXT PRIMARY KEY,
      created_at TEXT NOT NULL,
      expires_at TEXT NOT NULL,
      last_access_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_services_order ON registered_services(evaluation_order, id);
    CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
    "#,
  )?;

  record_version(conn, 1, "Create base tables (registered_services, sessions)")?;
  Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  let now = Utc::now().to_rfc3339();
  conn.execute(
    "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, now, description],
  )?;
  tracing::info!("Recorded schema version {} - {}", version, description);
  Ok(())
}

/// Get current schema version (0 if no versions recorded)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
  conn.query_row(
    "SELECT COALESCE(MAX(version), 0) FROM db_version",
    [],
    |row| row.get(0),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fresh_database_reaches_latest_version() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), 1);
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    let rows: i64 = conn
      .query_row("SELECT COUNT(*) FROM db_version", [], |row| row.get(0))
      .unwrap();
    assert_eq!(rows, 1);
  }

  #[test]
  fn test_theme_column_present() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
      .execute(
        "INSERT INTO registered_services (service_id, name, theme) VALUES ('https://x', 'X', 'dark')",
        [],
      )
      .unwrap();
  }
}

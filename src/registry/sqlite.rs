use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{RegistryResult, ServiceRegistry};
use crate::db::{try_lock, DbPool};
use crate::domain::RegisteredService;

const SERVICE_COLUMNS: &str = "id, service_id, name, description, theme, evaluation_order, \
  enabled, sso_enabled, anonymous_access, allowed_to_proxy";

/// Registry persisted in the `registered_services` table
#[derive(Clone)]
pub struct SqliteServiceRegistry {
  pool: DbPool,
}

impl SqliteServiceRegistry {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }
}

impl ServiceRegistry for SqliteServiceRegistry {
  fn get_all(&self) -> RegistryResult<Option<Vec<RegisteredService>>> {
    let conn = try_lock(&self.pool)?;
    Ok(Some(get_all_services(&conn)?))
  }

  fn find_by_id(&self, id: i64) -> RegistryResult<Option<RegisteredService>> {
    let conn = try_lock(&self.pool)?;
    Ok(get_service_by_id(&conn, id)?)
  }

  fn save(&self, service: RegisteredService) -> RegistryResult<RegisteredService> {
    let conn = try_lock(&self.pool)?;
    Ok(save_service(&conn, service)?)
  }

  fn delete(&self, id: i64) -> RegistryResult<Option<RegisteredService>> {
    let conn = try_lock(&self.pool)?;
    Ok(delete_service(&conn, id)?)
  }
}

fn row_to_service(row: &Row) -> rusqlite::Result<RegisteredService> {
  Ok(RegisteredService {
    id: row.get(0)?,
    service_id: row.get(1)?,
    name: row.get(2)?,
    description: row.get(3)?,
    theme: row.get(4)?,
    evaluation_order: row.get(5)?,
    enabled: row.get(6)?,
    sso_enabled: row.get(7)?,
    anonymous_access: row.get(8)?,
    allowed_to_proxy: row.get(9)?,
  })
}

pub fn get_all_services(conn: &Connection) -> rusqlite::Result<Vec<RegisteredService>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM registered_services ORDER BY evaluation_order ASC, id ASC",
    SERVICE_COLUMNS
  ))?;
  let services = stmt
    .query_map([], row_to_service)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(services)
}

pub fn get_service_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<RegisteredService>> {
  conn
    .query_row(
      &format!("SELECT {} FROM registered_services WHERE id = ?1", SERVICE_COLUMNS),
      params![id],
      row_to_service,
    )
    .optional()
}

pub fn save_service(conn: &Connection, mut service: RegisteredService) -> rusqlite::Result<RegisteredService> {
  if service.is_new() {
    conn.execute(
      r#"
      INSERT INTO registered_services (service_id, name, description, theme, evaluation_order,
                                       enabled, sso_enabled, anonymous_access, allowed_to_proxy)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      "#,
      params![
        service.service_id,
        service.name,
        service.description,
        service.theme,
        service.evaluation_order,
        service.enabled,
        service.sso_enabled,
        service.anonymous_access,
        service.allowed_to_proxy,
      ],
    )?;
    service.id = conn.last_insert_rowid();
    tracing::debug!("Inserted registered service {} ({})", service.id, service.name);
    return Ok(service);
  }

  // Upsert keeps an explicitly assigned id when the row does not exist yet
  conn.execute(
    r#"
    INSERT INTO registered_services (id, service_id, name, description, theme, evaluation_order,
                                     enabled, sso_enabled, anonymous_access, allowed_to_proxy)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(id) DO UPDATE SET
      service_id = excluded.service_id,
      name = excluded.name,
      description = excluded.description,
      theme = excluded.theme,
      evaluation_order = excluded.evaluation_order,
      enabled = excluded.enabled,
      sso_enabled = excluded.sso_enabled,
      anonymous_access = excluded.anonymous_access,
      allowed_to_proxy = excluded.allowed_to_proxy
    "#,
    params![
      service.id,
      service.service_id,
      service.name,
      service.description,
      service.theme,
      service.evaluation_order,
      service.enabled,
      service.sso_enabled,
      service.anonymous_access,
      service.allowed_to_proxy,
    ],
  )?;
  tracing::debug!("Saved registered service {} ({})", service.id, service.name);
  Ok(service)
}

pub fn delete_service(conn: &Connection, id: i64) -> rusqlite::Result<Option<RegisteredService>> {
  let Some(service) = get_service_by_id(conn, id)? else {
    return Ok(None);
  };
  conn.execute("DELETE FROM registered_services WHERE id = ?1", params![id])?;
  tracing::debug!("Deleted registered service {} ({})", id, service.name);
  Ok(Some(service))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::open_in_memory;

  fn registry() -> SqliteServiceRegistry {
    SqliteServiceRegistry::new(open_in_memory().unwrap())
  }

  #[test]
  fn test_empty_registry_is_present_not_absent() {
    let reg = registry();
    assert_eq!(reg.get_all().unwrap(), Some(vec![]));
  }

  #[test]
  fn test_save_new_assigns_id() {
    let reg = registry();
    let saved = reg.save(RegisteredService::new("https://a", "A")).unwrap();
    assert!(saved.id > 0);

    let found = reg.find_by_id(saved.id).unwrap().unwrap();
    assert_eq!(found, saved);
  }

  #[test]
  fn test_save_existing_updates_in_place() {
    let reg = registry();
    let mut saved = reg.save(RegisteredService::new("https://a", "A")).unwrap();
    saved.name = "Renamed".to_string();
    saved.evaluation_order = 4;
    saved.theme = Some("blue".to_string());
    reg.save(saved.clone()).unwrap();

    let all = reg.get_all().unwrap().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], saved);
  }

  #[test]
  fn test_save_with_unknown_id_inserts_that_id() {
    let reg = registry();
    let mut svc = RegisteredService::new("https://a", "A");
    svc.id = 77;
    reg.save(svc).unwrap();
    assert_eq!(reg.find_by_id(77).unwrap().unwrap().name, "A");
  }

  #[test]
  fn test_get_all_orders_by_evaluation_order_then_id() {
    let reg = registry();
    let mut first = RegisteredService::new("https://1", "first");
    first.evaluation_order = 5;
    let first = reg.save(first).unwrap();
    let second = reg.save(RegisteredService::new("https://2", "second")).unwrap();
    let third = reg.save(RegisteredService::new("https://3", "third")).unwrap();

    let ids: Vec<i64> = reg.get_all().unwrap().unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id, third.id, first.id]);
  }

  #[test]
  fn test_delete_returns_removed_service() {
    let reg = registry();
    let saved = reg.save(RegisteredService::new("https://a", "A")).unwrap();

    let removed = reg.delete(saved.id).unwrap();
    assert_eq!(removed, Some(saved.clone()));
    assert_eq!(reg.find_by_id(saved.id).unwrap(), None);
  }

  #[test]
  fn test_delete_unknown_returns_none() {
    let reg = registry();
    reg.save(RegisteredService::new("https://a", "A")).unwrap();
    assert_eq!(reg.delete(999).unwrap(), None);
    assert_eq!(reg.get_all().unwrap().unwrap().len(), 1);
  }

  #[test]
  fn test_matches_uses_patterns() {
    let reg = registry();
    reg.save(RegisteredService::new("https://app\\.example\\.org/.*", "App")).unwrap();
    assert!(reg.matches("https://app.example.org/home").unwrap());
    assert!(!reg.matches("https://other.example.org/").unwrap());
  }

  #[test]
  fn test_matches_skips_disabled_services() {
    let reg = registry();
    let mut svc = RegisteredService::new("https://.*", "Everything");
    svc.enabled = false;
    reg.save(svc).unwrap();
    assert!(!reg.matches("https://example.org").unwrap());
  }
}

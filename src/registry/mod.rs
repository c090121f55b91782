//! Storage and lookup of registered services.
//!
//! The admin console only talks to the registry through [`ServiceRegistry`],
//! so the storage backend is injected at startup.

pub mod sqlite;

use thiserror::Error;

use crate::db::DbLockError;
use crate::domain::RegisteredService;

pub use sqlite::SqliteServiceRegistry;

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("registry storage failed: {0}")]
  Storage(#[from] rusqlite::Error),
  #[error("registry unavailable: {0}")]
  Unavailable(#[from] DbLockError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

pub trait ServiceRegistry: Send + Sync {
  /// All services ordered by evaluation order, then id.
  ///
  /// `None` means the registry has no collection loaded at all, which is
  /// different from an empty registry.
  fn get_all(&self) -> RegistryResult<Option<Vec<RegisteredService>>>;

  fn find_by_id(&self, id: i64) -> RegistryResult<Option<RegisteredService>>;

  /// Insert a new service (`id == 0`) or update an existing one by id.
  /// Returns the stored service with its assigned id.
  fn save(&self, service: RegisteredService) -> RegistryResult<RegisteredService>;

  /// Remove a service, returning it, or `None` if the id is unknown
  fn delete(&self, id: i64) -> RegistryResult<Option<RegisteredService>>;

  /// Whether any registered service accepts `service_url`
  fn matches(&self, service_url: &str) -> RegistryResult<bool> {
    let services = self.get_all()?.unwrap_or_default();
    Ok(services.iter().any(|svc| svc.matches(service_url)))
  }
}

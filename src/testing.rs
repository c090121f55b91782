//! Test registries.
//!
//! Reuses the real SQLite registry over an in-memory database so tests run
//! against the authoritative schema.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::db::open_in_memory;
use crate::domain::RegisteredService;
use crate::registry::{RegistryResult, ServiceRegistry, SqliteServiceRegistry};

/// In-memory registry that counts writes
pub struct CountingRegistry {
    inner: SqliteServiceRegistry,
    saves: AtomicUsize,
    deletes: AtomicUsize,
}

impl CountingRegistry {
    pub fn new() -> Self {
        let pool = open_in_memory().expect("in-memory database");
        Self {
            inner: SqliteServiceRegistry::new(pool),
            saves: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl ServiceRegistry for CountingRegistry {
    fn get_all(&self) -> RegistryResult<Option<Vec<RegisteredService>>> {
        self.inner.get_all()
    }

    fn find_by_id(&self, id: i64) -> RegistryResult<Option<RegisteredService>> {
        self.inner.find_by_id(id)
    }

    fn save(&self, service: RegisteredService) -> RegistryResult<RegisteredService> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(service)
    }

    fn delete(&self, id: i64) -> RegistryResult<Option<RegisteredService>> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id)
    }
}

/// Registry that never has a collection loaded
pub struct UnloadedRegistry;

impl ServiceRegistry for UnloadedRegistry {
    fn get_all(&self) -> RegistryResult<Option<Vec<RegisteredService>>> {
        Ok(None)
    }

    fn find_by_id(&self, _id: i64) -> RegistryResult<Option<RegisteredService>> {
        Ok(None)
    }

    fn save(&self, service: RegisteredService) -> RegistryResult<RegisteredService> {
        Ok(service)
    }

    fn delete(&self, _id: i64) -> RegistryResult<Option<RegisteredService>> {
        Ok(None)
    }
}

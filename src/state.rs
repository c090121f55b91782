//! Application state passed to all handlers.

use std::sync::Arc;

use crate::admin::ServiceAdmin;
use crate::db::DbPool;
use crate::registry::ServiceRegistry;

#[derive(Clone)]
pub struct AppState {
    /// Registry of registered services
    pub registry: Arc<dyn ServiceRegistry>,

    /// The console's own service URL
    pub default_service_url: Arc<str>,

    /// Database holding admin sessions
    pub session_db: DbPool,

    /// Admin session lifetime in hours
    pub session_hours: i64,
}

impl AppState {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        default_service_url: impl Into<Arc<str>>,
        session_db: DbPool,
        session_hours: i64,
    ) -> Self {
        Self {
            registry,
            default_service_url: default_service_url.into(),
            session_db,
            session_hours,
        }
    }

    /// Services administration bound to this state's registry
    pub fn admin(&self) -> ServiceAdmin<'_> {
        ServiceAdmin::new(self.registry.as_ref(), &self.default_service_url)
    }
}

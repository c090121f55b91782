//! Registered services administration.
//!
//! Every read or delete goes through [`ServiceAdmin::ensure_default_service_exists`]
//! so the console's own URL always stays matchable. Without it the console
//! could not authenticate its own requests.

use crate::domain::{RegisteredService, RegisteredServiceView};
use crate::error::AdminError;
use crate::registry::ServiceRegistry;

/// Name given to the service re-created for the console itself
pub const DEFAULT_SERVICE_NAME: &str = "Services Management Web Application";

pub struct ServiceAdmin<'a> {
  registry: &'a dyn ServiceRegistry,
  default_service_url: &'a str,
}

impl<'a> ServiceAdmin<'a> {
  pub fn new(registry: &'a dyn ServiceRegistry, default_service_url: &'a str) -> Self {
    Self {
      registry,
      default_service_url,
    }
  }

  pub fn default_service_url(&self) -> &str {
    self.default_service_url
  }

  /// Register the console's own URL unless an existing service already matches it
  pub fn ensure_default_service_exists(&self) -> Result<(), AdminError> {
    if self.registry.get_all()?.is_none() {
      return Err(AdminError::Configuration(
        "Services cannot be empty".to_string(),
      ));
    }

    if !self.registry.matches(self.default_service_url)? {
      let service = RegisteredService::new(self.default_service_url, DEFAULT_SERVICE_NAME);
      let saved = self.registry.save(service)?;
      tracing::info!(
        "Registered default service {} for {}",
        saved.id,
        self.default_service_url
      );
    }
    Ok(())
  }

  /// Delete a service and return its name
  pub fn delete_service(&self, id: i64) -> Result<String, AdminError> {
    let removed = self.registry.delete(id)?.ok_or(AdminError::NotFound(id))?;
    tracing::info!("Deleted registered service {} ({})", id, removed.name);
    self.ensure_default_service_exists()?;
    Ok(removed.name)
  }

  /// Projection of every registered service, in registry order
  pub fn list_services(&self) -> Result<Vec<RegisteredServiceView>, AdminError> {
    self.ensure_default_service_exists()?;
    let services = self.registry.get_all()?.ok_or_else(|| {
      AdminError::Configuration("Services cannot be empty".to_string())
    })?;
    Ok(services.iter().map(RegisteredServiceView::from).collect())
  }

  /// Set each service's evaluation order to its position in `ids`.
  ///
  /// Updates are saved one by one; a missing id stops the run and leaves
  /// the services before it already updated.
  pub fn reorder_services(&self, ids: &[i64]) -> Result<(), AdminError> {
    if ids.is_empty() {
      return Err(AdminError::Validation(
        "No service id was received. Re-examine the request".to_string(),
      ));
    }

    for (position, &id) in ids.iter().enumerate() {
      let mut service = self
        .registry
        .find_by_id(id)?
        .ok_or(AdminError::NotFound(id))?;
      service.evaluation_order = i32::try_from(position).map_err(|_| {
        AdminError::Validation(format!("Too many service ids: {}", ids.len()))
      })?;
      self.registry.save(service)?;
    }

    tracing::debug!("Updated evaluation order for {} services", ids.len());
    Ok(())
  }
}

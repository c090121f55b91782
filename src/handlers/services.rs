//! JSON endpoints used by the manage page script.

use axum::{
  extract::{rejection::FormRejection, State},
  http::StatusCode,
  Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::RegisteredServiceView;
use crate::error::AdminError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DeleteServiceForm {
  pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedService {
  pub service_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceList {
  pub services: Vec<RegisteredServiceView>,
}

/// Repeated `id` fields, in the desired evaluation order
#[derive(Deserialize)]
pub struct EvaluationOrderForm {
  #[serde(default)]
  pub id: Vec<i64>,
}

/// POST /deleteRegisteredService
pub async fn delete_registered_service(
  State(state): State<AppState>,
  form: Result<Form<DeleteServiceForm>, FormRejection>,
) -> Result<Json<DeletedService>, AdminError> {
  let Form(form) = form.map_err(|rejection| {
    AdminError::Validation(format!("Invalid service id: {}", rejection))
  })?;

  let service_name = state.admin().delete_service(form.id)?;
  Ok(Json(DeletedService { service_name }))
}

/// GET /getServices
pub async fn get_services(State(state): State<AppState>) -> Result<Json<ServiceList>, AdminError> {
  let services = state.admin().list_services()?;
  Ok(Json(ServiceList { services }))
}

/// POST /updateRegisteredServiceEvaluationOrder
pub async fn update_evaluation_order(
  State(state): State<AppState>,
  form: Result<axum_extra::extract::Form<EvaluationOrderForm>, axum_extra::extract::FormRejection>,
) -> Result<StatusCode, AdminError> {
  let axum_extra::extract::Form(form) = form.map_err(|rejection| {
    AdminError::Validation(format!("Invalid service ids: {}", rejection))
  })?;

  state.admin().reorder_services(&form.id)?;
  Ok(StatusCode::OK)
}

//! Admin error kinds and the central error resolution for every route.
//!
//! Handlers return [`AdminError`]; its response carries only a status code
//! plus the error details in the response extensions. [`resolve_errors`]
//! then decides, based on the original request, whether the client gets a
//! JSON error body.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::RegistryError;

/// Header examined to detect asynchronous (XHR) requests
pub const AJAX_REQUEST_HEADER_NAME: &str = "x-requested-with";

/// Header value identifying asynchronous (XHR) requests
pub const AJAX_REQUEST_HEADER_VALUE: &str = "XMLHttpRequest";

#[derive(Debug, Error)]
pub enum AdminError {
    /// The registry could not provide a service collection at all
    #[error("{0}")]
    Configuration(String),
    #[error("Service id {0} cannot be found.")]
    NotFound(i64),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to render view: {0}")]
    Template(#[from] askama::Error),
}

impl AdminError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Registry(_) => "registry",
            Self::Template(_) => "template",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Registry(_) | Self::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error details parked in response extensions until [`resolve_errors`] runs
#[derive(Debug, Clone)]
pub struct UnresolvedError {
    pub kind: &'static str,
    pub message: String,
    pub detail: String,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let mut response = self.status_code().into_response();
        response.extensions_mut().insert(UnresolvedError {
            kind: self.kind(),
            message: self.to_string(),
            detail: format!("{:?}", self),
        });
        response
    }
}

/// JSON body written for asynchronous requests
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

/// Whether the request was sent by page script rather than navigation
pub fn is_ajax_request(headers: &HeaderMap) -> bool {
    headers
        .get(AJAX_REQUEST_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == AJAX_REQUEST_HEADER_VALUE)
}

/// Middleware resolving handler errors into client responses.
///
/// Every error is logged. Only asynchronous requests get a JSON body; other
/// requests keep the bare status for the outer error page handling.
pub async fn resolve_errors(request: Request, next: Next) -> Response {
    let ajax = is_ajax_request(request.headers());
    let mut response = next.run(request).await;

    let Some(error) = response.extensions_mut().remove::<UnresolvedError>() else {
        return response;
    };

    handle_error(ajax, response.status(), error)
}

pub fn handle_error(ajax: bool, status: StatusCode, error: UnresolvedError) -> Response {
    tracing::error!(kind = error.kind, detail = %error.detail, "{}", error.message);

    if ajax {
        tracing::debug!(
            "Handling {} error for ajax request indicated by header {}",
            error.kind,
            AJAX_REQUEST_HEADER_NAME
        );
        let body = ErrorBody {
            error: error.message,
            kind: error.kind,
        };
        (status, Json(body)).into_response()
    } else {
        tracing::trace!(
            "Unable to resolve {} error for request. Ajax request header {} not found.",
            error.kind,
            AJAX_REQUEST_HEADER_NAME
        );
        status.into_response()
    }
}

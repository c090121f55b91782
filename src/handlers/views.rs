use askama::Template;
use axum::{extract::State, response::Html};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::db::{try_lock, LogOnError};
use crate::error::AdminError;
use crate::session::{self, CurrentSession, SESSION_COOKIE_NAME};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "manage.html")]
pub struct ManageTemplate {
  pub default_service_url: String,
  pub version: &'static str,
}

#[derive(Template)]
#[template(path = "logout.html")]
pub struct LogoutTemplate {
  pub version: &'static str,
}

#[derive(Template)]
#[template(path = "authorization_failure.html")]
pub struct AuthorizationFailureTemplate {
  pub version: &'static str,
}

/// GET /manage - Services management page
pub async fn manage(State(state): State<AppState>) -> Result<Html<String>, AdminError> {
  let admin = state.admin();
  admin.ensure_default_service_exists()?;

  let template = ManageTemplate {
    default_service_url: admin.default_service_url().to_string(),
    version: env!("CARGO_PKG_VERSION"),
  };
  Ok(Html(template.render()?))
}

/// GET /logout - Invalidate the admin session
pub async fn logout(
  State(state): State<AppState>,
  CurrentSession(session_id): CurrentSession,
  jar: CookieJar,
) -> (CookieJar, Html<String>) {
  tracing::debug!("Invalidating application session...");

  if let Some(session_id) = session_id {
    match try_lock(&state.session_db) {
      Ok(conn) => {
        session::invalidate_session(&conn, &session_id).log_warn("Failed to invalidate session");
      }
      Err(e) => tracing::warn!("Failed to invalidate session: {}", e),
    }
  }

  let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
  let template = LogoutTemplate {
    version: env!("CARGO_PKG_VERSION"),
  };
  (jar, Html(template.render().unwrap_or_default()))
}

/// GET /authorizationFailure
pub async fn authorization_failure() -> Html<String> {
  let template = AuthorizationFailureTemplate {
    version: env!("CARGO_PKG_VERSION"),
  };
  Html(template.render().unwrap_or_default())
}

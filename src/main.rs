use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use svc_admin::config::AdminConfig;
use svc_admin::db::{self, LogOnError};
use svc_admin::registry::SqliteServiceRegistry;
use svc_admin::{routes, session, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "svc_admin=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AdminConfig::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");

  {
    let conn = pool.lock().expect("Database lock failed during startup");
    if let Some(count) = session::cleanup_expired_sessions(&conn).log_warn("Failed to clean up sessions") {
      tracing::debug!("Removed {} expired sessions", count);
    }
  }

  let registry = Arc::new(SqliteServiceRegistry::new(pool.clone()));
  let state = AppState::new(
    registry,
    config.default_service_url.as_str(),
    pool,
    config.session_hours,
  );

  // Register the console before the first request so it can authenticate itself
  if let Err(e) = state.admin().ensure_default_service_exists() {
    tracing::error!("Failed to register default service: {}", e);
  }

  let app = routes::build_router(state);

  let bind_addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config.port);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}

use axum::{
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::resolve_errors;
use crate::handlers;
use crate::session::ensure_session;
use crate::state::AppState;

/// Static assets directory (relative to the working directory)
pub const STATIC_DIR: &str = "static";

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/", get(|| async { Redirect::to("/manage") }))
        .route("/authorizationFailure", get(handlers::authorization_failure))
        .route("/logout", get(handlers::logout))
        .route("/manage", get(handlers::manage))
        .route("/getServices", get(handlers::get_services))
        .route("/deleteRegisteredService", post(handlers::delete_registered_service))
        .route(
            "/updateRegisteredServiceEvaluationOrder",
            post(handlers::update_evaluation_order),
        )
        .layer(middleware::from_fn(resolve_errors))
        .layer(middleware::from_fn_with_state(state.clone(), ensure_session));

    Router::new()
        .merge(admin)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

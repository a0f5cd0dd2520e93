use axum::routing::{get, post};
use axum::Router;

use crate::handlers::predict::{PASSTHROUGH_ROUTE, SAMPLE_ROUTE};
use crate::handlers::{self, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health_check))
        .route("/config", get(handlers::get_config))
        .route("/config/reload", post(handlers::reload_config))
        .route(
            PASSTHROUGH_ROUTE,
            get(handlers::passthrough_handler).post(handlers::passthrough_handler),
        )
        .route(
            SAMPLE_ROUTE,
            get(handlers::sample_handler).post(handlers::sample_handler),
        )
        .with_state(state)
}

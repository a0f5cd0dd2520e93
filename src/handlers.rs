pub mod predict;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, info};

use crate::client::PredictionClient;
use crate::config::ConfigHolder;

pub use predict::{passthrough_handler, sample_handler};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigHolder>,
    pub client: Arc<dyn PredictionClient>,
}

impl AppState {
    pub fn new(config: Arc<ConfigHolder>, client: Arc<dyn PredictionClient>) -> Self {
        Self { config, client }
    }
}

pub async fn get_health_check() -> Response {
    (StatusCode::OK, Body::from("OK")).into_response()
}

pub async fn get_config(State(state): State<AppState>) -> Response {
    let config = state.config.snapshot().redacted();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => (
            StatusCode::OK,
            [("content-type", "application/json")],
            json,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to serialize configuration: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.config.reload() {
        Ok(()) => {
            info!("Configuration reloaded");
            (StatusCode::OK, "Configuration reloaded successfully".to_string())
        }
        Err(e) => {
            error!("Failed to reload configuration: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to reload configuration: {}", e),
            )
        }
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::client::ClientError;

/// Faults a handler cannot turn into a prediction message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration value `{0}` is not set")]
    MissingSetting(&'static str),

    #[error("failed to encode prediction payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("prediction service call failed: {0}")]
    Upstream(#[from] ClientError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The cause is logged, never surfaced to the caller.
        error!(error = %self, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type AppResult<T> = Result<T, AppError>;

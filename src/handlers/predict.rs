use axum::extract::{Query, State};
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::AppState;
use crate::client::UpstreamReply;
use crate::error::AppResult;

pub const PASSTHROUGH_ROUTE: &str = "/api/predict";
pub const SAMPLE_ROUTE: &str = "/api/predict/sample";

pub const DATA_NOT_DEFINED: &str = "Data is not defined.";
pub const PREDICTION_PREFIX: &str = "Hello, The prediction is: ";
pub const PREDICTION_UNAVAILABLE: &str = "Unable to get prediction";

/// Rows sent by the sample handler regardless of the caller's input.
pub const SAMPLE_ROWS: [[i32; 10]; 2] = [
    [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
    [10, 9, 8, 7, 6, 5, 4, 3, 2, 1],
];

#[derive(Debug, Default)]
pub struct PredictParams {
    pub data: Option<String>,
}

// Read from a plain map so a repeated `data` key never rejects the request.
// The last occurrence wins.
impl From<HashMap<String, String>> for PredictParams {
    fn from(mut query: HashMap<String, String>) -> Self {
        Self {
            data: query.remove("data"),
        }
    }
}

impl PredictParams {
    /// The `data` parameter, treating an empty value as absent.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }
}

/// JSON document posted to the prediction service.
#[derive(Debug, Serialize)]
pub struct PredictionPayload<T> {
    pub data: T,
}

/// Splits on every comma. Empty segments are kept and nothing is trimmed.
pub fn passthrough_payload(data: &str) -> PredictionPayload<Vec<&str>> {
    PredictionPayload {
        data: data.split(',').collect(),
    }
}

pub fn sample_payload() -> PredictionPayload<[[i32; 10]; 2]> {
    PredictionPayload { data: SAMPLE_ROWS }
}

/// Text returned to the caller for an upstream reply.
pub fn render_reply(reply: &UpstreamReply) -> String {
    if reply.is_ok() {
        format!("{}{}", PREDICTION_PREFIX, reply.body)
    } else {
        PREDICTION_UNAVAILABLE.to_string()
    }
}

/// Forwards the comma-separated `data` values to the prediction service.
pub async fn passthrough_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> AppResult<String> {
    let params = PredictParams::from(query);
    info!(route = PASSTHROUGH_ROUTE, data = ?params.data, "prediction request received");

    let Some(data) = params.data() else {
        return Ok(DATA_NOT_DEFINED.to_string());
    };

    let upstream = state.config.snapshot().upstream;
    let url = upstream.web_service_url()?;
    let body = serde_json::to_vec(&passthrough_payload(data))?;

    forward(&state, PASSTHROUGH_ROUTE, url, body.into(), None).await
}

/// Sends the fixed sample rows with bearer authentication. The `data`
/// parameter only gates the call; its value is never sent.
pub async fn sample_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> AppResult<String> {
    let params = PredictParams::from(query);
    info!(route = SAMPLE_ROUTE, data = ?params.data, "prediction request received");

    if params.data().is_none() {
        return Ok(DATA_NOT_DEFINED.to_string());
    }

    let upstream = state.config.snapshot().upstream;
    let url = upstream.web_service_url()?;
    let api_key = upstream.api_key()?;
    let body = serde_json::to_vec(&sample_payload())?;

    forward(&state, SAMPLE_ROUTE, url, body.into(), Some(api_key)).await
}

async fn forward(
    state: &AppState,
    route: &str,
    url: &str,
    body: Bytes,
    bearer_token: Option<&str>,
) -> AppResult<String> {
    let start_time = Instant::now();
    let reply = state.client.post_json(url, body, bearer_token).await?;
    log_reply(route, &reply, start_time.elapsed());
    Ok(render_reply(&reply))
}

fn log_reply(route: &str, reply: &UpstreamReply, duration: Duration) {
    let mut log_entry = serde_json::json!({
        "type": "prediction",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "route": route,
        "status_code": reply.status,
        "duration_ms": (duration.as_millis() as u64),
        "body": reply.body,
    });

    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&reply.body) {
        log_entry["parsed_body"] = parsed;
    }

    let line = serde_json::to_string(&log_entry)
        .unwrap_or_else(|_| "Failed to serialize prediction log".to_string());
    if reply.is_ok() {
        info!("{}", line);
    } else {
        warn!("{}", line);
    }
}

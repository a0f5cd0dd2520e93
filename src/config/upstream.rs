use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;

/// Settings for the external prediction web service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub web_service_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Optional request timeout such as `30s` or `500ms`. Unset means no timeout.
    #[serde(default)]
    pub timeout: Option<String>,
}

impl UpstreamConfig {
    pub fn web_service_url(&self) -> Result<&str, AppError> {
        resolved(&self.web_service_url).ok_or(AppError::MissingSetting("web_service_url"))
    }

    pub fn api_key(&self) -> Result<&str, AppError> {
        resolved(&self.api_key).ok_or(AppError::MissingSetting("api_key"))
    }

    pub fn parse_timeout(&self) -> Option<Duration> {
        self.timeout.as_ref().and_then(|s| parse_duration_string(s))
    }

    /// Copy safe to expose over the config endpoint.
    pub fn redacted(&self) -> Self {
        Self {
            web_service_url: self.web_service_url.clone(),
            api_key: self.api_key.as_ref().map(|_| "***".to_string()),
            timeout: self.timeout.clone(),
        }
    }
}

// Empty values and placeholders left behind by env substitution count as unset.
fn resolved(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.contains("${"))
}

pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return None;
    }

    if let Some(suffix) = s.strip_suffix("ms") {
        suffix.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(suffix) = s.strip_suffix('s') {
        suffix.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else {
        None
    }
}

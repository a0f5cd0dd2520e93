//! Outbound calls to the prediction web service.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Status and raw body returned by the prediction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(String),

    #[error("timed out waiting for the prediction service")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Connection(err.to_string())
        } else {
            ClientError::Request(err.to_string())
        }
    }
}

/// Capability to POST a JSON document to the prediction service.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    /// Sends `body` as `application/json`. When `bearer_token` is set an
    /// `Authorization: Bearer` header is added; otherwise none is sent.
    async fn post_json(
        &self,
        url: &str,
        body: Bytes,
        bearer_token: Option<&str>,
    ) -> Result<UpstreamReply, ClientError>;
}

/// reqwest-backed client. Makes exactly one attempt per call.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: Client,
}

impl HttpPredictionClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn post_json(
        &self,
        url: &str,
        body: Bytes,
        bearer_token: Option<&str>,
    ) -> Result<UpstreamReply, ClientError> {
        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "prediction service replied");

        Ok(UpstreamReply { status, body })
    }
}

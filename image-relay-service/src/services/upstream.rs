//! Outbound client for the Gemini `generateContent` endpoint.
//!
//! One request per call: no retries, and no timeout unless one is configured.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

use crate::error::RelayError;
use crate::models::GenerateContentRequest;

/// Raw upstream answer; interpretation is left to the relay.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait ImageUpstream: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &Secret<String>,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply, RelayError>;
}

#[derive(Debug, Clone)]
pub struct GeminiUpstreamConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    pub model: String,
    pub timeout: Option<Duration>,
}

pub struct GeminiUpstream {
    client: Client,
    endpoint: String,
}

impl GeminiUpstream {
    pub fn new(config: GeminiUpstreamConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: generate_content_url(&config.base_url, &config.model),
        })
    }

    /// Endpoint without the credential.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn generate_content_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

/// reqwest errors embed the request URL, which carries the key.
fn transport_error(err: reqwest::Error, context: &'static str) -> RelayError {
    RelayError::Transport(anyhow::Error::new(err.without_url()).context(context))
}

#[async_trait]
impl ImageUpstream for GeminiUpstream {
    async fn generate_content(
        &self,
        api_key: &Secret<String>,
        request: &GenerateContentRequest,
    ) -> Result<UpstreamReply, RelayError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_contents = request.contents.is_some(),
            safety_settings = request.safety_settings.is_some(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key.expose_secret().as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, "Gemini request failed"))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, "Failed to read Gemini response body"))?;

        tracing::debug!(status = %status, bytes = body.len(), "Gemini API responded");

        Ok(UpstreamReply { status, body })
    }
}

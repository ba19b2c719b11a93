//! The relay handler: validate, attach the credential, call the upstream once,
//! and hand back its result.

use axum::body::Bytes;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::histogram;
use secrecy::{ExposeSecret, Secret};
use serde::de::IgnoredAny;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use super::upstream::{ImageUpstream, UpstreamReply};
use crate::error::{RelayError, UPSTREAM_FALLBACK_MESSAGE};
use crate::models::{GenerateContentRequest, UpstreamErrorEnvelope};

pub const MISSING_CONTENTS_MESSAGE: &str = "Request payload is missing 'contents'";

/// Behaviour toggles for the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Reject requests whose `contents` is absent or falsy before calling upstream.
    pub strict_validation: bool,
    /// Attach the fixed safety settings to every upstream request.
    pub include_safety_settings: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            strict_validation: true,
            include_safety_settings: true,
        }
    }
}

/// Successful relay result: the upstream's status and untouched JSON body.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct RelayHandler {
    upstream: Arc<dyn ImageUpstream>,
    credential: Option<Secret<String>>,
    options: RelayOptions,
}

impl RelayHandler {
    pub fn new(
        upstream: Arc<dyn ImageUpstream>,
        credential: Option<Secret<String>>,
        options: RelayOptions,
    ) -> Self {
        Self {
            upstream,
            credential,
            options,
        }
    }

    pub fn options(&self) -> RelayOptions {
        self.options
    }

    /// Whether a non-empty credential is available.
    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    fn credential(&self) -> Option<&Secret<String>> {
        self.credential
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
    }

    /// Relay one inbound request.
    ///
    /// Checks run in a fixed order (method, credential, payload) and each
    /// failure returns before the upstream is contacted.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> Result<RelayResponse, RelayError> {
        check_method(method)?;

        let api_key = self.credential().ok_or(RelayError::Configuration)?;

        let contents = extract_contents(body);
        if self.options.strict_validation && !contents.as_ref().is_some_and(is_truthy) {
            return Err(RelayError::Validation(MISSING_CONTENTS_MESSAGE.to_string()));
        }

        let request = GenerateContentRequest::new(contents, self.options.include_safety_settings);

        let started = Instant::now();
        let reply = self.upstream.generate_content(api_key, &request).await;
        histogram!("image_relay_upstream_duration_seconds").record(started.elapsed().as_secs_f64());

        interpret_reply(reply?)
    }
}

/// Only POST is relayed.
pub fn check_method(method: &Method) -> Result<(), RelayError> {
    if *method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }
    Ok(())
}

/// Pull `contents` out of the inbound body.
///
/// Empty, malformed or non-object bodies have no `contents`.
fn extract_contents(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut fields)) => fields.remove("contents"),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Inbound body is not valid JSON");
            None
        }
    }
}

/// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy; every
/// array and object, even empty, is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn interpret_reply(reply: UpstreamReply) -> Result<RelayResponse, RelayError> {
    let status = reply.status;

    if status.is_success() {
        serde_json::from_slice::<IgnoredAny>(&reply.body)
            .map_err(|e| non_json_body(e, status))?;

        return Ok(RelayResponse {
            status,
            body: reply.body,
        });
    }

    let parsed: Value = serde_json::from_slice(&reply.body).map_err(|e| non_json_body(e, status))?;

    let detail = serde_json::from_value::<UpstreamErrorEnvelope>(parsed)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_default();

    tracing::warn!(
        status = %status,
        upstream_code = ?detail.code,
        upstream_status = ?detail.status,
        upstream_message = ?detail.message,
        "Gemini API returned an error"
    );

    let message = detail
        .message
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| UPSTREAM_FALLBACK_MESSAGE.to_string());

    Err(RelayError::Upstream { status, message })
}

fn non_json_body(err: serde_json::Error, status: StatusCode) -> RelayError {
    RelayError::Transport(
        anyhow::Error::new(err).context(format!("Gemini API returned a non-JSON body ({status})")),
    )
}

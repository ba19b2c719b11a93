//! The browser-facing generation endpoint.

use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, http::Method};
use metrics::counter;

use crate::error::RelayError;
use crate::services::{check_method, RelayResponse};
use crate::startup::AppState;

/// Relay an image generation request to Gemini.
///
/// Mounted for every method so non-POST verbs receive the relay's own 405
/// body instead of the router's empty one. A body the extractor rejects
/// (e.g. over the size limit) still yields 405 for non-POST verbs, and a
/// JSON error with the rejection's status otherwise.
pub async fn generate(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<RelayResponse, RelayError> {
    let result = match body {
        Ok(body) => state.relay.handle(&method, &body).await,
        Err(rejection) => Err(match check_method(&method) {
            Err(err) => err,
            Ok(()) => RelayError::from(rejection),
        }),
    };

    match &result {
        Ok(response) => {
            counter!("image_relay_requests_total", "outcome" => "success").increment(1);
            tracing::info!(
                status = response.status.as_u16(),
                bytes = response.body.len(),
                "Relayed image generation response"
            );
        }
        Err(err) => {
            let kind = err.kind();
            counter!("image_relay_requests_total", "outcome" => kind.as_str()).increment(1);

            if kind.is_internal() {
                tracing::error!(
                    kind = kind.as_str(),
                    status = err.status_code().as_u16(),
                    error = %err,
                    "Image generation relay failed"
                );
            } else {
                tracing::warn!(
                    kind = kind.as_str(),
                    status = err.status_code().as_u16(),
                    error = %err,
                    "Image generation request rejected"
                );
            }
        }
    }

    result
}

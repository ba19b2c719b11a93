//! Wire types exchanged with callers and with the Gemini API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output modality requested from the image model.
pub const IMAGE_MODALITY: &str = "IMAGE";

/// Threshold applied to every harm category when safety settings are sent.
pub const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Harm categories covered by the fixed safety settings.
pub const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Caller-supplied prompt/image payload, forwarded untouched.
    /// Omitted entirely when the caller did not send one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Value>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
}

impl GenerateContentRequest {
    pub fn new(contents: Option<Value>, include_safety_settings: bool) -> Self {
        Self {
            contents,
            generation_config: GenerationConfig::image_only(),
            safety_settings: include_safety_settings.then(default_safety_settings),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

impl GenerationConfig {
    pub fn image_only() -> Self {
        Self {
            response_modalities: vec![IMAGE_MODALITY.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

pub fn default_safety_settings() -> Vec<SafetySetting> {
    SAFETY_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: category.to_string(),
            threshold: SAFETY_THRESHOLD.to_string(),
        })
        .collect()
}

/// The only error shape callers ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error envelope returned by the Gemini API.
#[derive(Debug, Default, Deserialize)]
pub struct UpstreamErrorEnvelope {
    #[serde(default)]
    pub error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

//! GeminiPlantAnalyzer - Direct REST API implementation of the leaf analyzer.
//!
//! Sends the leaf image inline with a fixed instruction to Gemini's
//! `generateContent` endpoint and validates the JSON it answers with.
//!
//! Retry policy: none. Each `analyze` call makes exactly one request, bounded
//! by the configured timeout. `AnalysisError::is_retryable` tells callers
//! whether trying again is worthwhile.

use async_trait::async_trait;
use leafdoc_core::analyzer::PlantAnalyzer;
use leafdoc_core::config::AnalyzerSettings;
use leafdoc_core::error::{AnalysisError, LeafdocError};
use leafdoc_core::scan::PlantAnalysis;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::analysis_parser::parse_analysis;
use crate::image_source::{EncodedImage, ImageSource};

const API_KEY_HEADER: &str = "x-goog-api-key";
const RESPONSE_PREVIEW_CHARS: usize = 200;

/// Instruction sent with every image.
pub const ANALYSIS_PROMPT: &str = r#"Analyze this plant leaf image and determine if it's healthy or has any diseases.
Provide a detailed analysis including:
1. Disease name or "Healthy Plant" if no issues
2. Confidence percentage (as a number without %)
3. Description of findings
4. Treatment recommendations
5. Severity level (0-5, where 0 is healthy, 1 is mild and 5 is severe)
6. Contributing factors assessment (High/Medium/Low for humidity, sunlight, airflow)

Format the response ONLY as valid JSON with these exact keys:
{
  "disease": "string",
  "confidence": number,
  "description": "string",
  "treatment": "string",
  "severity": number,
  "factors": {
    "humidity": "string",
    "sunlight": "string",
    "airflow": "string"
  }
}"#;

/// Analyzer implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiPlantAnalyzer {
    client: Client,
    api_key: Option<String>,
    settings: AnalyzerSettings,
}

impl GeminiPlantAnalyzer {
    /// Creates an analyzer. A missing key is allowed: every call then fails
    /// with `CapabilityUnavailable` instead of the engine failing to start.
    pub fn new(
        api_key: Option<String>,
        settings: AnalyzerSettings,
    ) -> Result<Self, LeafdocError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| LeafdocError::config(format!("Failed to build HTTP client: {e}")))?;

        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if api_key.is_none() {
            tracing::warn!("[Analyzer] No Gemini API key configured; analysis is unavailable");
        }

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    async fn send_request(
        &self,
        api_key: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, AnalysisError> {
        // The key travels in a header; transport errors echo the URL.
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AnalysisError::network(
                        format!(
                            "Gemini API request timed out after {}s",
                            self.settings.timeout_secs
                        ),
                        None,
                    )
                } else {
                    AnalysisError::network(format!("Gemini API request failed: {err}"), None)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AnalysisError::parse(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl PlantAnalyzer for GeminiPlantAnalyzer {
    async fn analyze(&self, image_reference: &str) -> Result<PlantAnalysis, AnalysisError> {
        let source = ImageSource::parse(image_reference)?;

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalysisError::capability_unavailable(
                "Gemini API key is not configured. Set GEMINI_API_KEY or add it to secret.json.",
            )
        })?;

        let image = source.encode(&self.client, &self.settings.mime_type).await?;
        tracing::debug!(
            "[Analyzer] Encoded {} ({}, {} base64 bytes)",
            image_reference,
            image.mime_type,
            image.data.len()
        );

        let request = GenerateContentRequest::for_image(ANALYSIS_PROMPT, image);
        tracing::info!("[Analyzer] Sending request to Gemini model {}", self.settings.model);
        let text = self.send_request(api_key, &request).await?;
        tracing::debug!(
            "[Analyzer] Raw response: {}",
            text.chars().take(RESPONSE_PREVIEW_CHARS).collect::<String>()
        );

        let analysis = parse_analysis(&text)?;
        tracing::info!(
            "[Analyzer] Diagnosis: {} ({})",
            analysis.disease,
            analysis.confidence
        );
        Ok(analysis)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn for_image(prompt: &str, image: EncodedImage) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: image.mime_type,
                            data: image.data,
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| AnalysisError::parse("Gemini API returned no text in the response candidates"))
}

fn map_http_error(status: StatusCode, body: &str) -> AnalysisError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AnalysisError::capability_unavailable(format!("Gemini rejected the API key: {message}"))
        }
        _ => AnalysisError::network(
            format!("Gemini API returned {status}: {message}"),
            Some(status.as_u16()),
        ),
    }
}

//! Google Gemini provider for aesthetic analysis.
//!
//! Thin reqwest client around `generateContent`: base64 photos go up as
//! inline data with a compact instruction block, the model's text comes back
//! verbatim. The returned payload is untrusted — parsing and validation
//! belong to the scoring pipeline, not here.

mod types;

use crate::error::ProviderError;
use reqwest::Client;
use std::time::Duration;
use types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_OUTPUT_TOKENS: u32 = 8192;
/// Low temperature: scoring should drift as little as the model allows.
const TEMPERATURE: f64 = 0.4;

/// Gemini client for one configured model.
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new client.
    ///
    /// API key resolution priority:
    /// 1. Explicit key passed in (config)
    /// 2. `GEMINI_API_KEY` environment variable
    /// 3. `GOOGLE_API_KEY` environment variable
    pub fn new(api_key: Option<&str>, model: impl Into<String>) -> Self {
        let resolved_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok());

        Self {
            api_key: resolved_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::Auth)
    }

    /// Submit the photos for analysis and return the model's raw text
    /// output.
    pub async fn analyze(
        &self,
        front_image: &str,
        side_image: Option<&str>,
        premium: bool,
    ) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;

        let mut parts = vec![
            Part::text(instruction_block(premium, side_image.is_some())),
            Part::inline_data(InlineData::jpeg(front_image)),
        ];
        if let Some(side) = side_image {
            parts.push(Part::inline_data(InlineData::jpeg(side)));
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={api_key}",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request {
                status: status.as_u16(),
                message: sanitize_error(&body),
            });
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if let Some(err) = result.error {
            return Err(ProviderError::Request {
                status: status.as_u16(),
                message: sanitize_error(&err.message),
            });
        }

        extract_text(&result)
    }
}

fn extract_text(result: &GenerateContentResponse) -> Result<String, ProviderError> {
    let text = result
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .map(|candidate| {
            let mut out = String::new();
            for part in &candidate.content.parts {
                if let Some(t) = &part.text {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(t);
                }
            }
            out
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text)
}

/// Compact request framing. The scoring behavior itself lives in the
/// pipeline, so this only pins the output contract and the capture context.
fn instruction_block(premium: bool, has_side: bool) -> String {
    let depth = if premium {
        "Analyze all facial features including eyebrows, chin and neck posture, \
         with subFeatures per feature and a ceilingScore10."
    } else {
        "Analyze the core facial features: skin, eye_area, nose, lips, cheekbones, jawline."
    };
    let side = if has_side {
        "A side profile photo is included; chin and nose projection can be assessed."
    } else {
        "No side profile photo; mark chin and nose projection as low confidence."
    };
    format!(
        "You are a facial aesthetics analyzer. Be honest and specific without being harsh. \
         Respond with STRICT JSON only: no markdown, no code fences, no extra text. \
         The JSON must contain photoQuality, overall, features, potential, harmony, \
         symmetry, hair, safety. Ratings are 0-10 with realistic variance. {depth} {side}"
    )
}

/// Keep upstream error text loggable: one line, bounded length.
fn sanitize_error(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 300 {
        let truncated: String = flat.chars().take(300).collect();
        format!("{truncated}…")
    } else {
        flat
    }
}

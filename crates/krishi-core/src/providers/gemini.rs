use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FetchError;
use crate::outcome::FetchOutcome;
use crate::request::{FetchRequest, FetchTarget};
use crate::transport::{RawResponse, Transport, TransportRequest};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const ELLIPSIS: &str = "...";
const KEY_PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY_HERE";

const MISSING_KEY: &str = "Generative API key is not set. Please check your key.";
const RECOMMENDATION_SHAPE: &str = "Failed to get recommendations. Check API key or response format.";

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn key(&self) -> Result<&str, FetchError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() && k != KEY_PLACEHOLDER => Ok(k),
            _ => Err(FetchError::Configuration(MISSING_KEY.to_string())),
        }
    }

    pub fn build(&self, request: &FetchRequest) -> Result<TransportRequest, FetchError> {
        match request.target() {
            FetchTarget::ChatReply | FetchTarget::SoilRecommendation => {}
            other => {
                return Err(FetchError::Validation(format!(
                    "generative client cannot send a {} request",
                    other.as_str()
                )))
            }
        }
        let key = self.key()?;
        let prompt = request
            .param("prompt")
            .ok_or_else(|| FetchError::Validation("Nothing to ask.".to_string()))?;

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| FetchError::Validation(format!("Could not encode prompt: {}", e)))?;

        Ok(TransportRequest::PostJson {
            url: format!(
                "{}/v1beta/models/{}:generateContent?key={}",
                self.base_url, self.model, key
            ),
            body,
        })
    }

    pub async fn chat_reply(
        &self,
        transport: &dyn Transport,
        request: &FetchRequest,
        max_len: usize,
    ) -> FetchOutcome<String> {
        match self.build(request) {
            Ok(call) => classify_chat_reply(transport.send(call).await, max_len),
            Err(err) => FetchOutcome::Error(err),
        }
    }

    pub async fn recommendation(
        &self,
        transport: &dyn Transport,
        request: &FetchRequest,
    ) -> FetchOutcome<String> {
        match self.build(request) {
            Ok(call) => classify_recommendation(transport.send(call).await),
            Err(err) => FetchOutcome::Error(err),
        }
    }
}

/// Chat replies are trimmed and cut to `max_len` characters.
pub fn classify_chat_reply(
    result: Result<RawResponse, FetchError>,
    max_len: usize,
) -> FetchOutcome<String> {
    match extract_text(result) {
        Ok(text) => FetchOutcome::Success(truncate_reply(text.trim(), max_len)),
        Err(err) => {
            warn!(error = %err, "chat reply unavailable");
            FetchOutcome::Error(err)
        }
    }
}

pub fn classify_recommendation(result: Result<RawResponse, FetchError>) -> FetchOutcome<String> {
    match extract_text(result) {
        Ok(text) => FetchOutcome::Success(text),
        Err(FetchError::Shape(detail)) => {
            warn!(%detail, "recommendation response had no candidates");
            FetchOutcome::Error(FetchError::Shape(RECOMMENDATION_SHAPE.to_string()))
        }
        Err(err) => {
            warn!(error = %err, "recommendation request failed");
            let message = format!("An error occurred: {}", err.message());
            FetchOutcome::Error(err.with_message(message))
        }
    }
}

/// Text longer than `max` characters becomes its first `max` characters plus [`ELLIPSIS`].
pub fn truncate_reply(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str(ELLIPSIS);
    out
}

fn extract_text(result: Result<RawResponse, FetchError>) -> Result<String, FetchError> {
    let raw = result?;

    if !raw.is_success() {
        let detail = serde_json::from_str::<GeminiErrorBody>(&raw.body)
            .ok()
            .map(|b| b.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("status {}", raw.status));
        return Err(match raw.status {
            400 | 401 | 403 if detail.to_lowercase().contains("api key") => {
                FetchError::Configuration(detail)
            }
            _ => FetchError::Network(detail),
        });
    }

    let response: GeminiResponse = serde_json::from_str(&raw.body)
        .map_err(|e| FetchError::Shape(format!("Unreadable generative response: {}", e)))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            FetchError::Shape("Generative response carried no candidate text".to_string())
        })
}

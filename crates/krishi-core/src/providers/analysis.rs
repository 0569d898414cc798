use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FetchError;
use crate::outcome::FetchOutcome;
use crate::request::{FetchRequest, FetchTarget};
use crate::transport::{RawResponse, Transport, TransportRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";
pub const UPLOAD_FIELD: &str = "file";

/// Crops the classification backend ships models for.
pub const SUPPORTED_CROPS: [&str; 4] = ["maize", "tomato", "cashew", "cassava"];

#[derive(Deserialize)]
struct PredictionBody {
    #[serde(default)]
    crop: Option<String>,
    #[serde(default)]
    prediction: Option<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct BackendError {
    error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub crop: String,
    pub label: String,
    /// Confidence scaled to 0–100.
    pub confidence_percent: f64,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Prediction for {}: {}. Confidence: {:.2}%",
            self.crop.to_uppercase(),
            self.label,
            self.confidence_percent
        )
    }
}

#[derive(Clone)]
pub struct AnalysisClient {
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, crop: &str) -> String {
        format!("{}/predict/{}", self.base_url, crop)
    }

    pub fn build(&self, request: &FetchRequest) -> Result<TransportRequest, FetchError> {
        if request.target() != FetchTarget::ImageAnalysis {
            return Err(FetchError::Validation(format!(
                "analysis client cannot send a {} request",
                request.target().as_str()
            )));
        }
        let param = |name: &str| {
            request
                .param(name)
                .map(str::to_string)
                .ok_or_else(|| FetchError::Validation(format!("missing {}", name)))
        };
        let crop = param("crop")?;

        Ok(TransportRequest::PostMultipart {
            url: self.endpoint(&crop),
            field: UPLOAD_FIELD.to_string(),
            file_name: param("file_name")?,
            mime: param("mime")?,
            path: PathBuf::from(param("image_uri")?),
        })
    }

    pub async fn analyze(
        &self,
        transport: &dyn Transport,
        request: &FetchRequest,
    ) -> FetchOutcome<AnalysisResult> {
        let endpoint = self.endpoint(request.param("crop").unwrap_or_default());
        match self.build(request) {
            Ok(call) => classify_analysis(transport.send(call).await, &endpoint),
            Err(err) => FetchOutcome::Error(err),
        }
    }
}

/// Every failure names the endpoint that was tried.
pub fn classify_analysis(
    result: Result<RawResponse, FetchError>,
    endpoint: &str,
) -> FetchOutcome<AnalysisResult> {
    match interpret(result) {
        Ok(analysis) => FetchOutcome::Success(analysis),
        Err(err) => {
            warn!(error = %err, %endpoint, "image analysis failed");
            let message = format!(
                "Analysis failed: {} Make sure the analysis server is running at {} and accessible.",
                err.message(),
                endpoint
            );
            FetchOutcome::Error(err.with_message(message))
        }
    }
}

fn interpret(result: Result<RawResponse, FetchError>) -> Result<AnalysisResult, FetchError> {
    let raw = result?;

    if !raw.is_success() {
        let message = match serde_json::from_str::<BackendError>(&raw.body) {
            Ok(body) => body.error,
            Err(_) => format!(
                "HTTP error! Status: {} - Response: {}...",
                raw.status,
                raw.body.chars().take(100).collect::<String>()
            ),
        };
        return Err(FetchError::Network(message));
    }

    let body: PredictionBody = serde_json::from_str(&raw.body)
        .map_err(|_| FetchError::Shape("Unexpected response format from AI backend.".to_string()))?;

    let confidence = body.confidence.as_ref().and_then(|c| c.as_f64());
    match (body.prediction, confidence) {
        (Some(label), Some(confidence)) if !label.is_empty() => Ok(AnalysisResult {
            crop: body.crop.unwrap_or_default(),
            label,
            confidence_percent: confidence * 100.0,
        }),
        _ => Err(FetchError::Shape(
            "Unexpected response format from AI backend.".to_string(),
        )),
    }
}

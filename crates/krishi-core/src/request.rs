//! Request Builder: raw user input in, immutable [`FetchRequest`] out.
//!
//! Free text that is blank blocks the request. Numeric readings never do;
//! they degrade to an `unknown` token instead.

use std::collections::BTreeMap;

use crate::error::FetchError;
use crate::providers::analysis::SUPPORTED_CROPS;
use crate::soil::{SoilParameter, SoilReadings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchTarget {
    Weather,
    ChatReply,
    ImageAnalysis,
    SoilRecommendation,
}

impl FetchTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchTarget::Weather => "weather",
            FetchTarget::ChatReply => "chat_reply",
            FetchTarget::ImageAnalysis => "image_analysis",
            FetchTarget::SoilRecommendation => "soil_recommendation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    target: FetchTarget,
    parameters: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn target(&self) -> FetchTarget {
        self.target
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    fn new(target: FetchTarget, parameters: Vec<(&str, String)>) -> Self {
        Self {
            target,
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn weather(city: &str) -> Result<Self, FetchError> {
        let city = required(city, "Please enter a city name.")?;
        Ok(Self::new(FetchTarget::Weather, vec![("city", city)]))
    }

    pub fn chat_reply(message: &str) -> Result<Self, FetchError> {
        let message = required(message, "Please type a message.")?;
        let prompt = format!("Please answer concisely in 2-3 sentences: {}", message);
        Ok(Self::new(
            FetchTarget::ChatReply,
            vec![("message", message), ("prompt", prompt)],
        ))
    }

    pub fn image_analysis(crop: &str, image_uri: &str) -> Result<Self, FetchError> {
        let image_uri = required(image_uri, "Please select an image first.")?;
        let crop = required(crop, "Please select a crop type for analysis.")?.to_lowercase();
        if !SUPPORTED_CROPS.contains(&crop.as_str()) {
            return Err(FetchError::Validation(format!(
                "No analysis model for '{}'. Choose one of: {}.",
                crop,
                SUPPORTED_CROPS.join(", ")
            )));
        }

        let extension = image_uri
            .rsplit('.')
            .next()
            .filter(|ext| !ext.contains('/') && *ext != image_uri)
            .map(str::to_lowercase)
            .unwrap_or_else(|| "jpeg".to_string());

        Ok(Self::new(
            FetchTarget::ImageAnalysis,
            vec![
                ("crop", crop),
                ("file_name", format!("photo.{}", extension)),
                ("mime", format!("image/{}", extension)),
                ("image_uri", image_uri),
            ],
        ))
    }

    /// Always succeeds: missing readings are sent as `unknown`.
    pub fn soil_recommendation(readings: &SoilReadings, crop: &str) -> Self {
        let crop = crop.trim().to_lowercase();
        let crop_context = if crop.is_empty() || crop == "general" {
            String::new()
        } else {
            format!(" for {}", capitalize(&crop))
        };

        let moisture = readings.describe(SoilParameter::Moisture);
        let temperature = readings.describe(SoilParameter::Temperature);
        let ph = readings.describe(SoilParameter::Ph);
        let nitrogen = readings.describe(SoilParameter::Nitrogen);

        let prompt = format!(
            "Based on the following soil parameters, provide concise agricultural recommendations{} for optimal crop growth. \
             Be specific and actionable, suggesting adjustments if a parameter is not optimal. \
             Moisture: {}, Temperature: {}, pH: {}, Nitrogen: {}. \
             If any parameter is missing or invalid, assume it's \"unknown\" and provide general advice.",
            crop_context, moisture, temperature, ph, nitrogen
        );

        Self::new(
            FetchTarget::SoilRecommendation,
            vec![
                ("crop", if crop.is_empty() { "general".to_string() } else { crop }),
                ("moisture", moisture),
                ("temperature", temperature),
                ("ph", ph),
                ("nitrogen", nitrogen),
                ("prompt", prompt),
            ],
        )
    }
}

fn required(raw: &str, message: &str) -> Result<String, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(FetchError::Validation(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::outcome::FetchOutcome;
use crate::request::{FetchRequest, FetchTarget};
use crate::transport::{RawResponse, Transport, TransportRequest};

pub const FORECAST_DAYS: u32 = 6;
pub const MAX_FORECAST_ENTRIES: usize = 5;
const KEY_PLACEHOLDER: &str = "YOUR_WEATHERAPI_KEY";

const MISSING_KEY: &str = "Weather API key is not set or invalid. Please check your key.";
const UNREACHABLE: &str = "Failed to fetch weather data. Please check city name or network connection.";
const PROVIDER_REJECTED: &str = "Could not fetch weather data. Please check city name.";

// ---- Provider wire shapes ----

#[derive(Deserialize)]
struct ForecastBody {
    location: ApiLocation,
    current: ApiCurrent,
    forecast: ApiForecast,
}

#[derive(Deserialize)]
struct ApiLocation {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct ApiCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    humidity: f64,
    wind_kph: f64,
    wind_degree: f64,
    pressure_mb: f64,
    condition: ApiCondition,
}

#[derive(Deserialize)]
struct ApiForecast {
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Deserialize)]
struct ApiForecastDay {
    date: String,
    day: ApiDay,
}

#[derive(Deserialize)]
struct ApiDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    condition: ApiCondition,
}

// ---- Normalized report ----

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub region: String,
    pub country: String,
    pub current: CurrentConditions,
    pub today: Option<TemperatureRange>,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temp_c: i64,
    pub condition: String,
    pub icon_url: String,
    pub humidity: i64,
    pub wind_kph: f64,
    pub wind_degree: f64,
    pub wind_direction: &'static str,
    pub pressure_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemperatureRange {
    pub min_c: i64,
    pub max_c: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub weekday: String,
    pub max_c: i64,
    pub min_c: i64,
    pub condition: String,
    pub icon_url: String,
}

/// Client for a weatherapi.com-compatible forecast endpoint.
#[derive(Clone)]
pub struct WeatherClient {
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    fn key(&self) -> Result<&str, FetchError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() && k != KEY_PLACEHOLDER => Ok(k),
            _ => Err(FetchError::Configuration(MISSING_KEY.to_string())),
        }
    }

    pub fn build(&self, request: &FetchRequest) -> Result<TransportRequest, FetchError> {
        if request.target() != FetchTarget::Weather {
            return Err(FetchError::Validation(format!(
                "weather client cannot send a {} request",
                request.target().as_str()
            )));
        }
        let key = self.key()?;
        let city = request
            .param("city")
            .ok_or_else(|| FetchError::Validation("Please enter a city name.".to_string()))?;

        Ok(TransportRequest::Get {
            url: format!("{}/v1/forecast.json", self.base_url),
            query: vec![
                ("key".to_string(), key.to_string()),
                ("q".to_string(), city.to_string()),
                ("days".to_string(), FORECAST_DAYS.to_string()),
                ("aqi".to_string(), "no".to_string()),
                ("alerts".to_string(), "no".to_string()),
            ],
        })
    }

    /// Build, send once, classify. A configuration problem never reaches the transport.
    pub async fn fetch(
        &self,
        transport: &dyn Transport,
        request: &FetchRequest,
        today: NaiveDate,
    ) -> FetchOutcome<WeatherReport> {
        let call = match self.build(request) {
            Ok(call) => call,
            Err(err) => return FetchOutcome::Error(err),
        };
        classify_weather(transport.send(call).await, today)
    }
}

/// Turn a transport result into a weather outcome. Never panics.
pub fn classify_weather(
    result: Result<RawResponse, FetchError>,
    today: NaiveDate,
) -> FetchOutcome<WeatherReport> {
    let raw = match result {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "weather request failed");
            return FetchOutcome::Error(err.with_message(UNREACHABLE));
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&raw.body) {
        Ok(v) => v,
        Err(e) if raw.is_success() => {
            return FetchOutcome::Error(FetchError::Shape(format!(
                "Weather provider returned an unreadable body: {}",
                e
            )))
        }
        Err(_) => {
            return FetchOutcome::Error(FetchError::Network(format!(
                "Weather provider responded with status {}",
                raw.status
            )))
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(PROVIDER_REJECTED)
            .to_string();
        debug!(status = raw.status, %message, "weather provider rejected request");
        return FetchOutcome::Error(match raw.status {
            401 | 403 => FetchError::Configuration(message),
            _ => FetchError::Network(message),
        });
    }

    if !raw.is_success() {
        return FetchOutcome::Error(FetchError::Network(format!(
            "Weather provider responded with status {}",
            raw.status
        )));
    }

    let body: ForecastBody = match serde_json::from_value(value) {
        Ok(b) => b,
        Err(e) => {
            return FetchOutcome::Error(FetchError::Shape(format!(
                "Unexpected weather response: {}",
                e
            )))
        }
    };

    match normalize(body, today) {
        Ok(report) => FetchOutcome::Success(report),
        Err(err) => FetchOutcome::Error(err),
    }
}

fn normalize(body: ForecastBody, today: NaiveDate) -> Result<WeatherReport, FetchError> {
    let mut days = Vec::with_capacity(body.forecast.forecastday.len());
    let mut today_range = None;

    for day in body.forecast.forecastday {
        let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").map_err(|e| {
            FetchError::Shape(format!("Unexpected forecast date '{}': {}", day.date, e))
        })?;
        let range = TemperatureRange {
            min_c: round_temp(day.day.mintemp_c),
            max_c: round_temp(day.day.maxtemp_c),
        };
        if date == today {
            today_range = Some(range);
            continue;
        }
        days.push(ForecastDay {
            date,
            weekday: date.format("%a").to_string(),
            max_c: range.max_c,
            min_c: range.min_c,
            condition: day.day.condition.text,
            icon_url: icon_url(&day.day.condition.icon),
        });
    }

    days.sort_by_key(|d| d.date);
    days.truncate(MAX_FORECAST_ENTRIES);

    let current = body.current;
    Ok(WeatherReport {
        location: body.location.name,
        region: body.location.region,
        country: body.location.country,
        current: CurrentConditions {
            temp_c: round_temp(current.temp_c),
            condition: current.condition.text,
            icon_url: icon_url(&current.condition.icon),
            humidity: current.humidity.round() as i64,
            wind_kph: (current.wind_kph * 10.0).round() / 10.0,
            wind_degree: current.wind_degree,
            wind_direction: wind_direction(current.wind_degree),
            pressure_mb: current.pressure_mb,
        },
        today: today_range,
        forecast: days,
    })
}

/// Nearest whole degree, halves away from zero.
pub fn round_temp(celsius: f64) -> i64 {
    celsius.round() as i64
}

/// Eight-point compass label for a bearing in degrees.
pub fn wind_direction(degree: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let normalized = degree.rem_euclid(360.0);
    let sector = ((normalized + 22.5) / 45.0) as usize % 8;
    POINTS[sector]
}

fn icon_url(icon: &str) -> String {
    if icon.starts_with("//") {
        format!("https:{}", icon)
    } else {
        icon.to_string()
    }
}

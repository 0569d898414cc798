#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use krishi_core::{AppContext, Config, MockTransport, Session, Transport};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

pub fn config_with_keys() -> Config {
    let mut config = Config::new();
    config.weather_api_key = Some("weather-test-key".to_string());
    config.gemini_api_key = Some("gemini-test-key".to_string());
    config
}

pub fn context(transport: MockTransport) -> (AppContext, Arc<MockTransport>) {
    let transport = Arc::new(transport);
    let ctx = AppContext::new(config_with_keys(), transport.clone(), Session::default());
    (ctx, transport)
}

pub fn context_with(transport: Arc<dyn Transport>) -> AppContext {
    AppContext::new(config_with_keys(), transport, Session::default())
}

/// A forecast body for `city` covering `today()` and the six days after it.
pub fn forecast_body(city: &str, current_temp: f64) -> String {
    let days: Vec<_> = (0..7)
        .map(|offset| {
            let date = today() + chrono::Duration::days(offset);
            serde_json::json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "day": {
                    "maxtemp_c": 34.6 + offset as f64,
                    "mintemp_c": 24.4,
                    "condition": { "text": "Partly cloudy", "icon": "//cdn.weatherapi.com/116.png" }
                }
            })
        })
        .collect();

    serde_json::json!({
        "location": { "name": city, "region": "Maharashtra", "country": "India" },
        "current": {
            "temp_c": current_temp,
            "humidity": 62,
            "wind_kph": 14.4,
            "wind_degree": 250,
            "pressure_mb": 1006.0,
            "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/113.png" }
        },
        "forecast": { "forecastday": days }
    })
    .to_string()
}

pub fn gemini_reply(text: &str) -> String {
    serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
        .to_string()
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use krishi_core::{
    ErrorKind, FetchError, FetchLifecycle, FetchOutcome, FetchRequest, InFlightPolicy,
    MockTransport, RawResponse, Transport, TransportRequest, ViewState, WeatherScreen,
};

use crate::common::{context, context_with, forecast_body, today};

mod common;

// =========================================================================
// Helpers
// =========================================================================

/// Answers each city after its own delay, so responses can overtake each other.
struct SlowCityTransport {
    delays: Vec<(&'static str, u64)>,
}

#[async_trait]
impl Transport for SlowCityTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse, FetchError> {
        let TransportRequest::Get { query, .. } = request else {
            return Err(FetchError::Network("unexpected request".to_string()));
        };
        let city = query
            .iter()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let delay = self
            .delays
            .iter()
            .find(|(c, _)| *c == city)
            .map(|(_, d)| *d)
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(RawResponse::new(200, forecast_body(&city, 30.0)))
    }
}

// =========================================================================
// Screen flows
// =========================================================================

#[tokio::test]
async fn test_weather_success_shapes_report() {
    let (ctx, transport) = context(MockTransport::new().respond(200, forecast_body("Pune", 29.5)));
    let mut screen = WeatherScreen::new();

    assert!(screen.search_on(&ctx, "Pune", today()).await);
    let ViewState::Resolved(FetchOutcome::Success(report)) = screen.state() else {
        panic!("expected a weather report, got {:?}", screen.state());
    };
    assert_eq!(report.location, "Pune");
    assert_eq!(report.current.temp_c, 30);
    assert_eq!(report.current.wind_direction, "W");
    assert!(report.current.icon_url.starts_with("https:"));

    assert_eq!(report.forecast.len(), 5);
    assert!(report.forecast.iter().all(|d| d.date != today()));
    assert!(report.forecast.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(report.today.map(|t| t.max_c), Some(35));

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    let TransportRequest::Get { url, query } = &sent[0] else {
        panic!("weather must be a GET");
    };
    assert!(url.ends_with("/v1/forecast.json"));
    assert!(query.contains(&("days".to_string(), "6".to_string())));
    assert!(query.contains(&("q".to_string(), "Pune".to_string())));
}

#[tokio::test]
async fn test_unknown_city_shows_provider_message() {
    let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
    let (ctx, _) = context(MockTransport::new().respond(400, body));
    let mut screen = WeatherScreen::new();

    screen.search_on(&ctx, "InvalidCityXYZ", today()).await;
    assert!(!screen.lifecycle().is_loading());
    let outcome = screen.lifecycle().outcome().unwrap();
    assert!(outcome.is_error());
    assert_eq!(outcome.message(), Some("No matching location found."));
}

#[tokio::test]
async fn test_network_fault_is_error_not_panic() {
    let (ctx, transport) = context(MockTransport::new().fail("connection reset"));
    let mut screen = WeatherScreen::new();

    screen.search_on(&ctx, "Nashik", today()).await;
    let err = screen.lifecycle().outcome().unwrap().error().unwrap().clone();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_missing_key_never_sends() {
    let transport = Arc::new(MockTransport::new());
    let mut ctx = context_with(transport.clone());
    ctx.config.weather_api_key = None;
    let mut screen = WeatherScreen::new();

    screen.search_on(&ctx, "Nashik", today()).await;
    let err = screen.lifecycle().outcome().unwrap().error().unwrap().clone();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_retry_repeats_the_last_city() {
    let (ctx, transport) = context(
        MockTransport::new()
            .fail("timeout")
            .respond(200, forecast_body("Indore", 31.0)),
    );
    let mut screen = WeatherScreen::new();

    screen.search_on(&ctx, "Indore", today()).await;
    assert!(screen.lifecycle().outcome().unwrap().is_error());

    assert!(screen.retry(&ctx).await);
    assert!(screen.lifecycle().outcome().unwrap().is_success());
    assert_eq!(transport.call_count(), 2);
    assert_eq!(transport.requests()[0], transport.requests()[1]);
}

#[tokio::test]
async fn test_same_input_same_outcome() {
    let body = forecast_body("Surat", 33.2);
    let (ctx, _) = context(MockTransport::new().respond(200, body.clone()).respond(200, body));
    let mut screen = WeatherScreen::new();

    screen.search_on(&ctx, "Surat", today()).await;
    let first = screen.state().clone();
    screen.search_on(&ctx, "Surat", today()).await;
    assert_eq!(&first, screen.state());
}

// =========================================================================
// Ordering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_response_for_older_city_is_discarded() {
    let transport: Arc<dyn Transport> = Arc::new(SlowCityTransport {
        delays: vec![("Delhi", 800), ("Mumbai", 100)],
    });
    let ctx = context_with(transport.clone());
    let client = ctx.weather_client();
    let mut lifecycle = FetchLifecycle::with_policy("weather", InFlightPolicy::Supersede);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    for city in ["Delhi", "Mumbai"] {
        let ticket = lifecycle.begin().unwrap();
        let request = FetchRequest::weather(city).unwrap();
        let (client, transport, tx) = (client.clone(), transport.clone(), tx.clone());
        tokio::spawn(async move {
            let outcome = client.fetch(transport.as_ref(), &request, today()).await;
            let _ = tx.send((ticket, outcome));
        });
    }
    drop(tx);

    let mut applied = Vec::new();
    while let Some((ticket, outcome)) = rx.recv().await {
        applied.push(lifecycle.resolve(ticket, outcome));
    }

    assert_eq!(applied, vec![true, false]);
    let report = lifecycle.outcome().unwrap().success().unwrap();
    assert_eq!(report.location, "Mumbai");
}

#[tokio::test]
async fn test_guarded_screen_ignores_trigger_while_loading() {
    let mut lifecycle: FetchLifecycle<()> = FetchLifecycle::new("weather");
    let ticket = lifecycle.begin().unwrap();
    assert!(lifecycle.begin().is_none());
    assert!(lifecycle.resolve(ticket, FetchOutcome::Success(())));
    assert!(lifecycle.begin().is_some());
}

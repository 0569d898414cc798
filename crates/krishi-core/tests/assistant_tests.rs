use std::io::Write;

use krishi_core::screens::{CHAT_FALLBACK, GREETING};
use krishi_core::{
    AnalysisScreen, ChatbotScreen, ErrorKind, FetchOutcome, MockTransport, ParameterStatus, Sender,
    SoilParameter, SoilReadings, SoilScreen, TransportRequest, ViewState,
};

use crate::common::{context, gemini_reply};

mod common;

fn readings(moisture: &str, temperature: &str, ph: &str, nitrogen: &str) -> SoilReadings {
    SoilReadings {
        moisture: moisture.to_string(),
        temperature: temperature.to_string(),
        ph: ph.to_string(),
        nitrogen: nitrogen.to_string(),
    }
}

// =========================================================================
// Assistant chat
// =========================================================================

#[tokio::test]
async fn test_help_with_no_network_still_gets_a_bot_bubble() {
    let (ctx, _) = context(MockTransport::new());
    let mut chat = ChatbotScreen::new();

    chat.send(&ctx, "help").await;

    let messages = chat.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].text.as_deref(), Some(GREETING));
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[2].sender, Sender::Bot);
    assert_eq!(messages[2].text.as_deref(), Some(CHAT_FALLBACK));
    assert!(!chat.is_typing());
}

#[tokio::test]
async fn test_long_reply_is_truncated() {
    let long = "Irrigate early in the morning. ".repeat(20);
    let (ctx, transport) = context(MockTransport::new().respond(200, gemini_reply(&long)));
    let mut chat = ChatbotScreen::new();

    chat.send(&ctx, "When should I water tomatoes?").await;

    let reply = chat.messages().last().unwrap().text.clone().unwrap();
    assert_eq!(reply.chars().count(), 303);
    assert!(reply.ends_with("..."));

    let TransportRequest::PostJson { url, body } = &transport.requests()[0] else {
        panic!("chat must POST json");
    };
    assert!(url.contains("gemini-2.0-flash:generateContent"));
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "Please answer concisely in 2-3 sentences: When should I water tomatoes?"
    );
}

#[tokio::test]
async fn test_same_question_twice_renders_the_same_reply() {
    let long = "सुबह जल्दी सिंचाई करें। Mulch the beds after watering. ".repeat(12);
    let (ctx, _) = context(
        MockTransport::new()
            .respond(200, gemini_reply(&long))
            .respond(200, gemini_reply(&long)),
    );
    let mut chat = ChatbotScreen::new();

    chat.send(&ctx, "When should I water wheat?").await;
    chat.send(&ctx, "When should I water wheat?").await;

    let bot: Vec<_> = chat
        .messages()
        .iter()
        .filter(|m| m.sender == Sender::Bot)
        .skip(1)
        .map(|m| m.text.clone().unwrap())
        .collect();
    assert_eq!(bot.len(), 2);
    assert_eq!(bot[0], bot[1]);
    assert_eq!(bot[0].chars().count(), 303);
    assert_eq!(chat.state(), &ViewState::Resolved(FetchOutcome::Success(bot[1].clone())));
}

#[tokio::test]
async fn test_ids_stay_unique_across_turns() {
    let (ctx, _) = context(
        MockTransport::new()
            .respond(200, gemini_reply("Yes."))
            .respond(200, gemini_reply("No.")),
    );
    let mut chat = ChatbotScreen::new();
    chat.send(&ctx, "one").await;
    chat.send(&ctx, "two").await;

    let mut ids: Vec<_> = chat.messages().iter().map(|m| m.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

// =========================================================================
// Soil
// =========================================================================

#[test]
fn test_soil_statuses() {
    let low = SoilScreen::statuses(&readings("15", "", "", ""));
    assert_eq!(low[0].0, SoilParameter::Moisture);
    assert_eq!(low[0].1.status, ParameterStatus::Low);

    let invalid = SoilScreen::statuses(&readings("abc", "", "", ""));
    assert_eq!(invalid[0].1.status, ParameterStatus::Invalid);

    let unknown = SoilScreen::statuses(&readings("", "", "", ""));
    assert!(unknown.iter().all(|(_, a)| a.status == ParameterStatus::Unknown));
}

#[tokio::test]
async fn test_soil_prompt_sends_unknown_for_bad_readings() {
    let (ctx, transport) = context(MockTransport::new().respond(200, gemini_reply("Add lime.")));
    let mut soil = SoilScreen::new();

    soil.recommend(&ctx, &readings("abc", "24", "", "120"), "rice").await;
    assert_eq!(
        soil.state(),
        &ViewState::Resolved(FetchOutcome::Success("Add lime.".to_string()))
    );

    let TransportRequest::PostJson { body, .. } = &transport.requests()[0] else {
        panic!("soil must POST json");
    };
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Moisture: unknown"));
    assert!(prompt.contains("Temperature: 24°C"));
    assert!(prompt.contains("Nitrogen: 120 PPM"));
    assert!(prompt.contains("for Rice"));
}

#[tokio::test]
async fn test_soil_without_candidates_is_shape_error() {
    let (ctx, _) = context(MockTransport::new().respond(200, r#"{"candidates":[]}"#));
    let mut soil = SoilScreen::new();

    soil.recommend(&ctx, &SoilReadings::default(), "").await;
    let ViewState::Resolved(outcome) = soil.state() else {
        panic!("expected resolved");
    };
    assert_eq!(outcome.error().unwrap().kind(), ErrorKind::Shape);
    assert_eq!(
        outcome.message(),
        Some("Failed to get recommendations. Check API key or response format.")
    );
}

// =========================================================================
// Image analysis
// =========================================================================

#[tokio::test]
async fn test_analysis_requires_image_first() {
    let (ctx, transport) = context(MockTransport::new());
    let mut screen = AnalysisScreen::new();

    screen.analyze(&ctx, "", "").await;
    let ViewState::Resolved(outcome) = screen.state() else {
        panic!("expected resolved");
    };
    assert_eq!(outcome.message(), Some("Please select an image first."));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_analysis_success_then_retry() {
    let mut image = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    image.write_all(b"\x89PNG fake").unwrap();
    let path = image.path().to_string_lossy().to_string();

    let body = r#"{"crop":"cassava","prediction":"mosaic disease","confidence":0.875}"#;
    let (ctx, transport) = context(MockTransport::new().respond(200, body).fail("refused"));
    let mut screen = AnalysisScreen::new();

    screen.analyze(&ctx, "Cassava", &path).await;
    let ViewState::Resolved(FetchOutcome::Success(result)) = screen.state() else {
        panic!("expected a prediction");
    };
    assert_eq!(
        result.to_string(),
        "Prediction for CASSAVA: mosaic disease. Confidence: 87.50%"
    );

    screen.retry(&ctx).await;
    let ViewState::Resolved(outcome) = screen.state() else {
        panic!("expected resolved");
    };
    assert_eq!(outcome.error().unwrap().kind(), ErrorKind::Network);
    assert!(outcome
        .message()
        .unwrap()
        .contains("http://localhost:5001/predict/cassava"));
    assert_eq!(transport.call_count(), 2);
}

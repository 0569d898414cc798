//! Screen controllers.
//!
//! Each fetch screen owns one [`FetchLifecycle`] and runs the same pipeline:
//! build the request, send it once, classify, resolve. Input that fails to
//! build resolves straight to a `Validation` error without touching the
//! transport. `retry` re-runs the last input from the top.

use std::future::Future;

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::catalog::{self, CropPrice, CropSeason, ForumPost, Scheme, SchemeCategory};
use crate::chat::{ChatLog, ChatMessage};
use crate::context::AppContext;
use crate::error::FetchError;
use crate::lifecycle::{FetchLifecycle, ViewState};
use crate::outcome::FetchOutcome;
use crate::providers::{AnalysisResult, WeatherReport};
use crate::request::FetchRequest;
use crate::soil::{Assessment, SoilParameter, SoilReadings};

pub const GREETING: &str =
    "Hello! I am Surender, your farming assistant 🌾. Ask me anything about farming!";
pub const CHAT_FALLBACK: &str = "I'm unable to respond right now. Please try again.";

/// Begin, await, resolve. Returns `false` when guarded or when the result was stale.
async fn drive<T, F>(lifecycle: &mut FetchLifecycle<T>, fetch: F) -> bool
where
    F: Future<Output = FetchOutcome<T>>,
{
    let Some(ticket) = lifecycle.begin() else {
        return false;
    };
    let outcome = fetch.await;
    lifecycle.resolve(ticket, outcome)
}

// ============================================================================
// Weather
// ============================================================================

pub struct WeatherScreen {
    lifecycle: FetchLifecycle<WeatherReport>,
    last_city: Option<String>,
}

impl Default for WeatherScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherScreen {
    /// Searches hold `&mut self` across the await, so a screen never has two
    /// requests in flight. Overlap is handled by [`FetchLifecycle`] itself.
    pub fn new() -> Self {
        Self {
            lifecycle: FetchLifecycle::new("weather"),
            last_city: None,
        }
    }

    pub fn state(&self) -> &ViewState<WeatherReport> {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &FetchLifecycle<WeatherReport> {
        &self.lifecycle
    }

    pub async fn search(&mut self, ctx: &AppContext, city: &str) -> bool {
        self.search_on(ctx, city, Local::now().date_naive()).await
    }

    /// As [`search`](Self::search) with an explicit local date for forecast filtering.
    pub async fn search_on(&mut self, ctx: &AppContext, city: &str, today: NaiveDate) -> bool {
        let request = match FetchRequest::weather(city) {
            Ok(request) => request,
            Err(err) => return self.lifecycle.resolve_immediately(FetchOutcome::Error(err)),
        };
        self.last_city = Some(city.to_string());
        let client = ctx.weather_client();
        drive(
            &mut self.lifecycle,
            client.fetch(ctx.transport(), &request, today),
        )
        .await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        match self.last_city.clone() {
            Some(city) => self.search(ctx, &city).await,
            None => false,
        }
    }
}

// ============================================================================
// Assistant chat
// ============================================================================

/// The floating assistant. A bot bubble always follows a sent message, even
/// when the reply could not be fetched.
pub struct ChatbotScreen {
    log: ChatLog,
    lifecycle: FetchLifecycle<String>,
}

impl Default for ChatbotScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatbotScreen {
    pub fn new() -> Self {
        let mut log = ChatLog::new("c");
        log.push_bot(GREETING);
        Self {
            log,
            lifecycle: FetchLifecycle::new("chatbot"),
        }
    }

    /// Show the assistant; the session records that it is open.
    pub fn open(ctx: &mut AppContext) -> Self {
        ctx.session.set_chat_visible(true);
        Self::new()
    }

    pub fn close(self, ctx: &mut AppContext) {
        ctx.session.set_chat_visible(false);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.messages()
    }

    pub fn state(&self) -> &ViewState<String> {
        self.lifecycle.state()
    }

    /// The "typing" indicator.
    pub fn is_typing(&self) -> bool {
        self.lifecycle.is_loading()
    }

    /// Blank input, or input while a reply is pending, is ignored.
    pub async fn send(&mut self, ctx: &AppContext, message: &str) -> bool {
        if self.lifecycle.is_loading() {
            return false;
        }
        let Ok(request) = FetchRequest::chat_reply(message) else {
            return false;
        };
        if self.log.push_user_text(message).is_err() {
            return false;
        }
        let Some(ticket) = self.lifecycle.begin() else {
            return false;
        };

        let client = ctx.gemini_client();
        let outcome = client
            .chat_reply(ctx.transport(), &request, ctx.config.max_reply_length())
            .await;

        let reply = outcome.success().cloned().unwrap_or_else(|| CHAT_FALLBACK.to_string());
        self.log.push_bot(&reply);
        self.lifecycle.resolve(ticket, outcome)
    }

    /// Send the last user message again.
    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        let last = self
            .log
            .messages()
            .iter()
            .rev()
            .find(|m| m.sender.is_user())
            .and_then(|m| m.text.clone());
        match last {
            Some(text) => self.send(ctx, &text).await,
            None => false,
        }
    }
}

// ============================================================================
// Image analysis
// ============================================================================

pub struct AnalysisScreen {
    lifecycle: FetchLifecycle<AnalysisResult>,
    last: Option<(String, String)>,
}

impl Default for AnalysisScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisScreen {
    pub fn new() -> Self {
        Self {
            lifecycle: FetchLifecycle::new("analysis"),
            last: None,
        }
    }

    pub fn state(&self) -> &ViewState<AnalysisResult> {
        self.lifecycle.state()
    }

    pub async fn analyze(&mut self, ctx: &AppContext, crop: &str, image_uri: &str) -> bool {
        let request = match FetchRequest::image_analysis(crop, image_uri) {
            Ok(request) => request,
            Err(err) => return self.lifecycle.resolve_immediately(FetchOutcome::Error(err)),
        };
        self.last = Some((crop.to_string(), image_uri.to_string()));
        let client = ctx.analysis_client();
        drive(&mut self.lifecycle, client.analyze(ctx.transport(), &request)).await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        match self.last.clone() {
            Some((crop, image)) => self.analyze(ctx, &crop, &image).await,
            None => false,
        }
    }
}

// ============================================================================
// Soil recommendations
// ============================================================================

pub struct SoilScreen {
    lifecycle: FetchLifecycle<String>,
    last: Option<(SoilReadings, String)>,
}

impl Default for SoilScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl SoilScreen {
    pub fn new() -> Self {
        Self {
            lifecycle: FetchLifecycle::new("soil"),
            last: None,
        }
    }

    pub fn state(&self) -> &ViewState<String> {
        self.lifecycle.state()
    }

    /// Status badges shown beside each input. Pure, no fetch.
    pub fn statuses(readings: &SoilReadings) -> Vec<(SoilParameter, Assessment)> {
        readings.assess_all()
    }

    pub async fn recommend(
        &mut self,
        ctx: &AppContext,
        readings: &SoilReadings,
        crop: &str,
    ) -> bool {
        let request = FetchRequest::soil_recommendation(readings, crop);
        self.last = Some((readings.clone(), crop.to_string()));
        let client = ctx.gemini_client();
        drive(
            &mut self.lifecycle,
            client.recommendation(ctx.transport(), &request),
        )
        .await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        match self.last.clone() {
            Some((readings, crop)) => self.recommend(ctx, &readings, &crop).await,
            None => false,
        }
    }
}

// ============================================================================
// Catalog screens
// ============================================================================

pub struct CalendarScreen {
    lifecycle: FetchLifecycle<Vec<CropSeason>>,
    states: Vec<String>,
    selected: Option<String>,
}

impl CalendarScreen {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            lifecycle: FetchLifecycle::new("calendar"),
            states: ctx.catalog.states(),
            selected: None,
        }
    }

    pub fn state(&self) -> &ViewState<Vec<CropSeason>> {
        self.lifecycle.state()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Picker entries matching the search box.
    pub fn search(&self, query: &str) -> Vec<&String> {
        catalog::filter_options(&self.states, query)
    }

    pub async fn select_state(&mut self, ctx: &AppContext, state: &str) -> bool {
        if state.trim().is_empty() {
            return self.lifecycle.resolve_immediately(FetchOutcome::Error(
                FetchError::Validation("Please select a state.".to_string()),
            ));
        }
        self.selected = Some(state.trim().to_string());
        drive(&mut self.lifecycle, ctx.catalog.crop_calendar(state)).await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        match self.selected.clone() {
            Some(state) => self.select_state(ctx, &state).await,
            None => false,
        }
    }
}

pub struct SchemesScreen {
    lifecycle: FetchLifecycle<Vec<Scheme>>,
    category: SchemeCategory,
}

impl Default for SchemesScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemesScreen {
    pub fn new() -> Self {
        Self {
            lifecycle: FetchLifecycle::new("schemes"),
            category: SchemeCategory::default(),
        }
    }

    pub fn state(&self) -> &ViewState<Vec<Scheme>> {
        self.lifecycle.state()
    }

    pub fn category(&self) -> SchemeCategory {
        self.category
    }

    pub async fn select(&mut self, ctx: &AppContext, category: SchemeCategory) -> bool {
        self.category = category;
        drive(&mut self.lifecycle, ctx.catalog.schemes(category)).await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        self.select(ctx, self.category).await
    }
}

pub struct ForumScreen {
    lifecycle: FetchLifecycle<Vec<ForumPost>>,
}

impl Default for ForumScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ForumScreen {
    pub fn new() -> Self {
        Self {
            lifecycle: FetchLifecycle::new("forum"),
        }
    }

    pub fn state(&self) -> &ViewState<Vec<ForumPost>> {
        self.lifecycle.state()
    }

    pub async fn load(&mut self, ctx: &AppContext) -> bool {
        drive(&mut self.lifecycle, ctx.catalog.forum_posts()).await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        self.load(ctx).await
    }
}

pub struct MarketScreen {
    lifecycle: FetchLifecycle<Vec<CropPrice>>,
}

impl Default for MarketScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketScreen {
    pub fn new() -> Self {
        Self {
            lifecycle: FetchLifecycle::new("market"),
        }
    }

    pub fn state(&self) -> &ViewState<Vec<CropPrice>> {
        self.lifecycle.state()
    }

    pub async fn load(&mut self, ctx: &AppContext) -> bool {
        drive(&mut self.lifecycle, ctx.catalog.market_prices()).await
    }

    pub async fn retry(&mut self, ctx: &AppContext) -> bool {
        self.load(ctx).await
    }
}

// ============================================================================
// Forum thread
// ============================================================================

/// One discussion, seeded with earlier messages. Sending is local only.
pub struct ForumThread {
    topic: String,
    log: ChatLog,
}

impl ForumThread {
    pub async fn open(ctx: &AppContext, topic: &str) -> Result<Self, FetchError> {
        let log = match ctx.catalog.thread_seed().await {
            FetchOutcome::Success(seed) => ChatLog::seeded("m", seed),
            FetchOutcome::Empty { .. } => ChatLog::new("m"),
            FetchOutcome::Error(err) => return Err(err),
        };
        info!(%topic, messages = log.len(), "thread opened");
        Ok(Self {
            topic: topic.to_string(),
            log,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.messages()
    }

    pub fn send_text(&mut self, text: &str) -> Result<&ChatMessage, FetchError> {
        self.log.push_user_text(text)
    }

    pub fn send_voice(&mut self, voice_ref: &str) -> Result<&ChatMessage, FetchError> {
        if voice_ref.trim().is_empty() {
            return Err(FetchError::Validation("No recording to send.".to_string()));
        }
        Ok(self.log.push_voice(voice_ref.trim()))
    }
}

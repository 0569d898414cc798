//! Local reference tables served as if they were remote.
//!
//! Every lookup waits `latency` before answering so screens go through the
//! same Loading state they would with a real backend. Tests set it to zero.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::{ChatMessage, Sender};
use crate::error::FetchError;
use crate::outcome::FetchOutcome;

const CROP_CALENDAR: &str = include_str!("../data/crop_calendar.json");
const SCHEMES: &str = include_str!("../data/schemes.json");
const FORUM_POSTS: &str = include_str!("../data/forum_posts.json");
const FORUM_THREAD: &str = include_str!("../data/forum_thread.json");
const MARKET_PRICES: &str = include_str!("../data/market_prices.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSeason {
    pub name: String,
    pub sowing: String,
    pub growing: String,
    pub harvesting: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeStatus {
    Previous,
    Upcoming,
    NewlyLaunched,
}

impl SchemeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SchemeStatus::Previous => "Previous",
            SchemeStatus::Upcoming => "Upcoming",
            SchemeStatus::NewlyLaunched => "Newly Launched",
        }
    }
}

/// The two tabs of the schemes screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemeCategory {
    Previous,
    #[default]
    Upcoming,
}

impl SchemeCategory {
    pub fn includes(&self, status: SchemeStatus) -> bool {
        match self {
            SchemeCategory::Previous => status == SchemeStatus::Previous,
            SchemeCategory::Upcoming => {
                matches!(status, SchemeStatus::Upcoming | SchemeStatus::NewlyLaunched)
            }
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            SchemeCategory::Previous => "previous",
            SchemeCategory::Upcoming => "upcoming or newly launched",
        }
    }
}

impl FromStr for SchemeCategory {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "previous" => Ok(SchemeCategory::Previous),
            "upcoming" | "new" => Ok(SchemeCategory::Upcoming),
            other => Err(FetchError::Validation(format!(
                "Unknown tab '{}'. Use previous or upcoming.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: String,
    pub name: String,
    pub description: String,
    pub launch_date: String,
    pub status: SchemeStatus,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub eligibility: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: String,
    pub user: String,
    pub timestamp: String,
    pub topic: String,
    pub last_message: String,
    pub messages_count: u32,
    #[serde(default)]
    pub voice_support: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPrice {
    pub id: String,
    pub name: String,
    pub price_per_kg: f64,
    pub unit: String,
    pub trend: PriceTrend,
    pub last_updated: String,
    pub mandi: String,
}

#[derive(Deserialize)]
struct ThreadSeedMessage {
    id: String,
    sender: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    voice: Option<String>,
    timestamp: String,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogSource {
    latency: Duration,
}

impl CatalogSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// No simulated delay.
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn crop_calendar(&self, state: &str) -> FetchOutcome<Vec<CropSeason>> {
        self.simulate_latency().await;
        let table: BTreeMap<String, Vec<CropSeason>> =
            match parse_table(CROP_CALENDAR, "crop calendar") {
                Ok(t) => t,
                Err(err) => return FetchOutcome::Error(err),
            };
        let state = state.trim();
        let seasons = table
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(state))
            .map(|(_, seasons)| seasons)
            .filter(|seasons| !seasons.is_empty());

        match seasons {
            Some(seasons) => FetchOutcome::Success(seasons),
            None => {
                debug!(%state, "no crop calendar entry");
                FetchOutcome::empty(format!(
                    "No specific crop data available for {}. Displaying general data if available.",
                    state
                ))
            }
        }
    }

    pub async fn schemes(&self, category: SchemeCategory) -> FetchOutcome<Vec<Scheme>> {
        self.simulate_latency().await;
        let all: Vec<Scheme> = match parse_table(SCHEMES, "schemes") {
            Ok(t) => t,
            Err(err) => return FetchOutcome::Error(err),
        };
        let matching: Vec<Scheme> = all
            .into_iter()
            .filter(|s| category.includes(s.status))
            .collect();

        if matching.is_empty() {
            FetchOutcome::empty(format!(
                "No {} schemes found at this time.",
                category.describe()
            ))
        } else {
            FetchOutcome::Success(matching)
        }
    }

    pub async fn forum_posts(&self) -> FetchOutcome<Vec<ForumPost>> {
        self.simulate_latency().await;
        list_outcome(parse_table(FORUM_POSTS, "forum posts"), "No discussions yet.")
    }

    pub async fn market_prices(&self) -> FetchOutcome<Vec<CropPrice>> {
        self.simulate_latency().await;
        list_outcome(parse_table(MARKET_PRICES, "market prices"), "No market prices available.")
    }

    /// Earlier messages of a forum thread. Sender `Me` is the signed-in user.
    pub async fn thread_seed(&self) -> FetchOutcome<Vec<ChatMessage>> {
        self.simulate_latency().await;
        let seed: Vec<ThreadSeedMessage> = match parse_table(FORUM_THREAD, "forum thread") {
            Ok(t) => t,
            Err(err) => return FetchOutcome::Error(err),
        };
        FetchOutcome::Success(
            seed.into_iter()
                .map(|m| ChatMessage {
                    id: m.id,
                    sender: if m.sender == "Me" {
                        Sender::User
                    } else {
                        Sender::Member(m.sender)
                    },
                    text: m.text,
                    voice_ref: m.voice,
                    timestamp: m.timestamp,
                })
                .collect(),
        )
    }

    /// State names for the calendar picker, alphabetical.
    pub fn states(&self) -> Vec<String> {
        parse_table::<BTreeMap<String, serde_json::Value>>(CROP_CALENDAR, "crop calendar")
            .map(|t| t.into_keys().collect())
            .unwrap_or_default()
    }
}

/// Case-insensitive substring filter used by pickers with a search box.
pub fn filter_options<'a>(options: &'a [String], query: &str) -> Vec<&'a String> {
    let query = query.trim().to_lowercase();
    options
        .iter()
        .filter(|o| o.to_lowercase().contains(&query))
        .collect()
}

fn parse_table<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, FetchError> {
    serde_json::from_str(raw)
        .map_err(|e| FetchError::Shape(format!("Could not read {} data: {}", what, e)))
}

fn list_outcome<T>(parsed: Result<Vec<T>, FetchError>, empty: &str) -> FetchOutcome<Vec<T>> {
    match parsed {
        Ok(items) if items.is_empty() => FetchOutcome::empty(empty),
        Ok(items) => FetchOutcome::Success(items),
        Err(err) => FetchOutcome::Error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crop_calendar_lookup() {
        let catalog = CatalogSource::instant();
        let outcome = catalog.crop_calendar("Punjab").await;
        let seasons = outcome.success().unwrap();
        assert_eq!(seasons.len(), 4);
        assert_eq!(seasons[0].name, "Wheat");
        assert_eq!(seasons[0].harvesting, "Apr-May");

        assert!(catalog.crop_calendar("punjab").await.is_success());
    }

    #[tokio::test]
    async fn test_unknown_state_is_empty() {
        let outcome = CatalogSource::instant().crop_calendar("Goa").await;
        assert_eq!(
            outcome.message(),
            Some("No specific crop data available for Goa. Displaying general data if available.")
        );
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn test_scheme_categories() {
        let catalog = CatalogSource::instant();
        let previous = catalog.schemes(SchemeCategory::Previous).await;
        assert!(previous.success().unwrap().iter().all(|s| s.status == SchemeStatus::Previous));
        assert_eq!(previous.success().unwrap().len(), 4);

        let upcoming = catalog.schemes(SchemeCategory::Upcoming).await;
        let statuses: Vec<_> = upcoming.success().unwrap().iter().map(|s| s.status).collect();
        assert!(statuses.contains(&SchemeStatus::NewlyLaunched));
        assert!(!statuses.contains(&SchemeStatus::Previous));
    }

    #[test]
    fn test_scheme_tab_parsing() {
        assert_eq!("Previous".parse::<SchemeCategory>().unwrap(), SchemeCategory::Previous);
        assert_eq!(" new ".parse::<SchemeCategory>().unwrap(), SchemeCategory::Upcoming);
        let err = "archived".parse::<SchemeCategory>().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(err.to_string(), "Unknown tab 'archived'. Use previous or upcoming.");
    }

    #[tokio::test]
    async fn test_forum_and_prices() {
        let catalog = CatalogSource::instant();
        let posts = catalog.forum_posts().await;
        assert_eq!(posts.success().unwrap().len(), 5);
        assert!(posts.success().unwrap()[2].voice_support);

        let prices = catalog.market_prices().await;
        let wheat = prices.success().unwrap().iter().find(|p| p.id == "wheat").unwrap();
        assert_eq!(wheat.trend, PriceTrend::Stable);
        assert_eq!(wheat.mandi, "Chandigarh");
    }

    #[tokio::test]
    async fn test_thread_seed_maps_senders() {
        let seed = CatalogSource::instant().thread_seed().await;
        let messages = seed.success().unwrap();
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[0].sender, Sender::Member("Farmer John".to_string()));
        assert_eq!(messages[5].voice_ref.as_deref(), Some("voice_message_1.mp3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let catalog = CatalogSource::new(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        catalog.forum_posts().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn test_state_filter() {
        let states = CatalogSource::instant().states();
        assert_eq!(states.len(), 14);
        let hits = filter_options(&states, "PRADESH");
        assert_eq!(hits.len(), 3);
        assert_eq!(filter_options(&states, "").len(), 14);
        assert!(filter_options(&states, "xyz").is_empty());
    }
}

pub mod catalog;
pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod outcome;
pub mod providers;
pub mod request;
pub mod screens;
pub mod soil;
pub mod transport;

// Re-export main types for convenience
pub use catalog::{CatalogSource, CropPrice, CropSeason, ForumPost, Scheme, SchemeCategory};
pub use chat::{ChatLog, ChatMessage, Sender};
pub use config::Config;
pub use context::{AppContext, Session, SessionStore};
pub use error::{ErrorKind, FetchError};
pub use lifecycle::{FetchLifecycle, InFlightPolicy, Ticket, ViewState};
pub use outcome::FetchOutcome;
pub use providers::{AnalysisClient, AnalysisResult, GeminiClient, WeatherClient, WeatherReport};
pub use request::{FetchRequest, FetchTarget};
pub use screens::{
    AnalysisScreen, CalendarScreen, ChatbotScreen, ForumScreen, ForumThread, MarketScreen,
    SchemesScreen, SoilScreen, WeatherScreen,
};
pub use soil::{ParameterStatus, SoilParameter, SoilReadings};
pub use transport::{HttpTransport, MockTransport, RawResponse, Transport, TransportRequest};

pub mod analysis;
pub mod gemini;
pub mod weather;

pub use analysis::{AnalysisClient, AnalysisResult};
pub use gemini::GeminiClient;
pub use weather::{WeatherClient, WeatherReport};

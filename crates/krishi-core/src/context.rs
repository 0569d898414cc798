//! Shared state handed to every screen.
//!
//! Nothing here is global: the front end builds one [`AppContext`] and passes
//! it by reference to the screen controllers it drives.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::catalog::CatalogSource;
use crate::config::{self, Config};
use crate::error::FetchError;
use crate::providers::{AnalysisClient, GeminiClient, WeatherClient};
use crate::transport::{HttpTransport, Transport};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "userToken", default)]
    pub token: Option<String>,
    #[serde(default)]
    pub chat_visible: bool,
}

/// The one account the local sign-in accepts.
pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";

impl Session {
    pub fn is_signed_in(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Both fields are required before the credentials are compared.
    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<(), FetchError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(FetchError::Validation(
                "Please enter both email and password.".to_string(),
            ));
        }
        if !email.eq_ignore_ascii_case(DEMO_EMAIL) || password != DEMO_PASSWORD {
            return Err(FetchError::Validation("Invalid email or password.".to_string()));
        }
        self.token = Some(format!("local:{}", email.to_lowercase()));
        Ok(())
    }

    pub fn set_chat_visible(&mut self, visible: bool) {
        self.chat_visible = visible;
    }
}

/// Persists the [`Session`] as JSON next to the config file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(config::config_dir()?.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid session file {}: {}", self.path.display(), e))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    /// Check the credentials and persist the new token.
    pub fn sign_in(&self, session: &mut Session, email: &str, password: &str) -> Result<()> {
        session.sign_in(email, password)?;
        self.save(session)?;
        info!(email = %email.trim(), "signed in");
        Ok(())
    }

    /// Drop the stored token. The rest of the session survives.
    pub fn sign_out(&self, session: &mut Session) -> Result<()> {
        session.token = None;
        self.save(session)?;
        info!("signed out");
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub transport: Arc<dyn Transport>,
    pub catalog: CatalogSource,
    pub session: Session,
}

impl AppContext {
    pub fn new(config: Config, transport: Arc<dyn Transport>, session: Session) -> Self {
        let catalog = CatalogSource::new(config.catalog_latency());
        Self {
            config,
            transport,
            catalog,
            session,
        }
    }

    /// Real HTTP transport.
    pub fn from_config(config: Config, session: Session) -> Self {
        Self::new(config, Arc::new(HttpTransport::new()), session)
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn weather_client(&self) -> WeatherClient {
        WeatherClient::new(
            self.config.weather_base_url(),
            self.config.weather_api_key.as_deref(),
        )
    }

    pub fn gemini_client(&self) -> GeminiClient {
        GeminiClient::new(
            self.config.gemini_base_url(),
            self.config.gemini_model(),
            self.config.gemini_api_key.as_deref(),
        )
    }

    pub fn analysis_client(&self) -> AnalysisClient {
        AnalysisClient::new(self.config.analysis_base_url())
    }
}

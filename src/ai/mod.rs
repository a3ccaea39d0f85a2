//! External AI collaborators.
//!
//! The state machine only sees the two contracts defined here:
//! [`NewsQueryService`] for news discovery and [`DocumentVerifier`] for
//! identity document checks. [`gemini::GeminiClient`] binds both to the
//! Gemini `generateContent` endpoint.

use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;
pub mod news;
pub mod utils;
pub mod verification;

pub use gemini::GeminiClient;
pub use news::{fetch_aggregated_news, NewsBatch, NewsQuery, RawNewsRecord};
pub use verification::{DocumentSelection, EncodedDocument, Verdict};

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default Gemini REST base
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Errors raised by a collaborator call
#[derive(Error, Debug)]
pub enum AiError {
    #[error("API key is missing or empty")]
    AuthenticationError,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Document read error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AiResult<T> = Result<T, AiError>;

/// Connection settings for the AI backend
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_seconds: u64,
    /// Reasoning budget for the news query. `None` leaves it to the model.
    pub thinking_budget: Option<u32>,
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: 60,
            thinking_budget: Some(1024),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AiConfig {
    /// Build a config from `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_MODEL`
    /// and `GEMINI_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .unwrap_or_default();
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_seconds = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            api_key,
            model,
            timeout_seconds,
            ..Self::default()
        }
    }
}

/// News discovery collaborator.
///
/// Implementations return the raw records for a query. Turning them into
/// dashboard items, and swallowing failures, is done by
/// [`news::fetch_aggregated_news`].
#[async_trait]
pub trait NewsQueryService: Send + Sync {
    async fn query_news(&self, query: &NewsQuery) -> AiResult<NewsBatch>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Identity document verification collaborator.
#[async_trait]
pub trait DocumentVerifier: Send + Sync {
    async fn verify_document(&self, document: &EncodedDocument) -> AiResult<Verdict>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

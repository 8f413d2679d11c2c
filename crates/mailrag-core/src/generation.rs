//! Generation client contract.
//!
//! Every text-generation backend implements [`Generator`]. Task
//! orchestrators only ever see this trait; the concrete backend is chosen
//! once from configuration by the app crate.
//!
//! Failures are returned as [`GenerationError`]. Orchestrators absorb them
//! with [`apology`], so callers always receive text; use [`is_apology`] to
//! tell a real answer from a fallback.

use async_trait::async_trait;
use thiserror::Error;

/// Fixed prefix of every absorbed-failure message.
pub const APOLOGY_PREFIX: &str = "Sorry, I couldn't generate a response";

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend rejected the request or could not be reached.
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },
    #[error("generation provider is disabled")]
    Disabled,
    #[error("generation provider returned an empty response")]
    EmptyResponse,
}

impl GenerationError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        GenerationError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Per-call sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name used in logs and error messages (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Generate a completion for a single user prompt.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError>;
}

/// A generator that refuses every call.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

/// User-visible text standing in for a failed generation.
pub fn apology(err: &GenerationError) -> String {
    format!("{} at this time. Error: {}", APOLOGY_PREFIX, err)
}

pub fn is_apology(text: &str) -> bool {
    text.starts_with(APOLOGY_PREFIX)
}

//! Concrete generation backends.
//!
//! Each backend implements [`mailrag_core::generation::Generator`] over one
//! vendor's HTTP API:
//!
//! | Config Value | Backend | Endpoint |
//! |-------------|---------|----------|
//! | `"openai"` | [`OpenAiGenerator`] | `POST /v1/chat/completions` |
//! | `"grok"` | [`OpenAiGenerator`] | `POST https://api.x.ai/v1/chat/completions` |
//! | `"anthropic"` | [`AnthropicGenerator`] | `POST /v1/messages` |
//! | `"gemini"` | [`GeminiGenerator`] | `POST /v1beta/models/{model}:generateContent` |
//! | `"ollama"` | [`OllamaGenerator`] | `POST /api/generate` |
//! | `"disabled"` | [`DisabledGenerator`] | none |
//!
//! Non-success statuses become [`GenerationError::Provider`] carrying the
//! status and response body. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;

pub use mailrag_core::generation::{
    DisabledGenerator, GenerationError, GenerationParams, Generator,
};

use crate::config::GenerationConfig;

const OPENAI_URL: &str = "https://api.openai.com/v1";
const GROK_URL: &str = "https://api.x.ai/v1";
const ANTHROPIC_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const OLLAMA_URL: &str = "http://localhost:11434";

fn build_client(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Send `request` and return the decoded JSON body.
async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<Value, GenerationError> {
    let response = request
        .send()
        .await
        .map_err(|e| GenerationError::provider(provider, e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerationError::provider(
            provider,
            format!("HTTP {}: {}", status, body),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| GenerationError::provider(provider, format!("invalid JSON: {}", e)))
}

fn non_empty(text: String) -> Result<String, GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

// ============ OpenAI-compatible ============

/// Chat-completions backend. Also serves Grok through x.ai's
/// OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: String,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key,
            client: build_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": params.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body);
        let json = send_json(&self.name, request).await?;
        parse_chat_completion(&self.name, &json).and_then(non_empty)
    }
}

fn parse_chat_completion(provider: &str, json: &Value) -> Result<String, GenerationError> {
    json.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GenerationError::provider(provider, "response has no choices[0].message.content")
        })
}

// ============ Anthropic ============

pub struct AnthropicGenerator {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: String,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client: build_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": params.model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });
        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let json = send_json(self.name(), request).await?;
        parse_anthropic(&json).and_then(non_empty)
    }
}

/// Concatenate the `text` blocks of a messages response.
fn parse_anthropic(json: &Value) -> Result<String, GenerationError> {
    let blocks = json
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::provider("anthropic", "response has no content array"))?;
    Ok(blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(""))
}

// ============ Gemini ============

pub struct GeminiGenerator {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: String,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client: build_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": params.temperature,
                "maxOutputTokens": params.max_tokens,
            },
        });
        let request = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url.trim_end_matches('/'),
                params.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let json = send_json(self.name(), request).await?;
        parse_gemini(&json).and_then(non_empty)
    }
}

fn parse_gemini(json: &Value) -> Result<String, GenerationError> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            GenerationError::provider("gemini", "response has no candidates[0].content.parts")
        })?;
    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(""))
}

// ============ Ollama ============

pub struct OllamaGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": params.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "num_predict": params.max_tokens,
            },
        });
        let request = self
            .client
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&body);
        let json = send_json(self.name(), request).await?;
        json.get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::provider("ollama", "response has no `response` field"))
            .and_then(non_empty)
    }
}

/// Sampling parameters from configuration.
pub fn generation_params(config: &GenerationConfig) -> GenerationParams {
    GenerationParams {
        model: config.model_name(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

fn api_key(config: &GenerationConfig) -> Result<String> {
    let var = config
        .api_key_var()
        .ok_or_else(|| anyhow!("generation provider '{}' takes no API key", config.provider))?;
    match std::env::var(&var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("{} environment variable not set", var),
    }
}

/// Create the [`Generator`] named by `config.provider`.
///
/// # Errors
///
/// Returns an error for unknown providers or when the provider's API key
/// variable is unset.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    let url = |default: &str| config.url.clone().unwrap_or_else(|| default.to_string());
    let timeout = config.timeout_secs;

    let generator: Arc<dyn Generator> = match config.provider.as_str() {
        "disabled" => Arc::new(DisabledGenerator),
        "openai" => Arc::new(OpenAiGenerator::new(
            "openai",
            url(OPENAI_URL),
            api_key(config)?,
            timeout,
        )?),
        "grok" => Arc::new(OpenAiGenerator::new(
            "grok",
            url(GROK_URL),
            api_key(config)?,
            timeout,
        )?),
        "anthropic" => Arc::new(AnthropicGenerator::new(
            url(ANTHROPIC_URL),
            api_key(config)?,
            timeout,
        )?),
        "gemini" => Arc::new(GeminiGenerator::new(url(GEMINI_URL), api_key(config)?, timeout)?),
        "ollama" => Arc::new(OllamaGenerator::new(url(OLLAMA_URL), timeout)?),
        other => bail!("Unknown generation provider: {}", other),
    };
    tracing::debug!(
        provider = generator.name(),
        model = %config.model_name(),
        "generation backend ready"
    );
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_completion() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello there"}}]
        });
        assert_eq!(parse_chat_completion("openai", &json).unwrap(), "Hello there");

        let err = parse_chat_completion("grok", &serde_json::json!({"choices": []})).unwrap_err();
        assert!(err.to_string().starts_with("grok error"));
    }

    #[test]
    fn test_parse_anthropic_joins_text_blocks() {
        let json = serde_json::json!({
            "content": [
                {"type": "text", "text": "Part one. "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "Part two."}
            ]
        });
        assert_eq!(parse_anthropic(&json).unwrap(), "Part one. Part two.");
    }

    #[test]
    fn test_parse_gemini() {
        let json = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Category: Travel"}]}}]
        });
        assert_eq!(parse_gemini(&json).unwrap(), "Category: Travel");
        assert!(parse_gemini(&serde_json::json!({"candidates": []})).is_err());
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert!(matches!(
            non_empty("  \n".to_string()),
            Err(GenerationError::EmptyResponse)
        ));
        assert_eq!(non_empty("ok".to_string()).unwrap(), "ok");
    }

    #[test]
    fn test_generation_params_from_config() {
        let config = GenerationConfig {
            provider: "gemini".into(),
            temperature: 0.3,
            max_tokens: 256,
            ..GenerationConfig::default()
        };
        let params = generation_params(&config);
        assert_eq!(params.model, "gemini-2.5-flash");
        assert_eq!(params.temperature, 0.3);
        assert_eq!(params.max_tokens, 256);
    }

    #[test]
    fn test_create_generator_disabled_and_ollama() {
        let disabled = create_generator(&GenerationConfig::default()).unwrap();
        assert_eq!(disabled.name(), "disabled");

        let ollama = create_generator(&GenerationConfig {
            provider: "ollama".into(),
            ..GenerationConfig::default()
        })
        .unwrap();
        assert_eq!(ollama.name(), "ollama");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let config = GenerationConfig {
            provider: "anthropic".into(),
            api_key_env: Some("MAILRAG_TEST_UNSET_KEY_VAR".into()),
            ..GenerationConfig::default()
        };
        let err = create_generator(&config).err().unwrap();
        assert!(err.to_string().contains("MAILRAG_TEST_UNSET_KEY_VAR"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_provider_error() {
        let generator = OllamaGenerator::new("http://127.0.0.1:1", Some(2)).unwrap();
        let err = generator
            .generate("hi", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }
}

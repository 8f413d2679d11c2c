//! TOML configuration.
//!
//! Every section is optional and falls back to serde defaults;
//! [`load_config`] then validates the combination. API keys never live in
//! the file, only the names of the environment variables holding them.
//!
//! ```toml
//! [mail]
//! source = "file"
//! path = "mail/inbox.json"
//!
//! [embedding]
//! provider = "local"
//! model = "all-minilm-l6-v2"
//!
//! [generation]
//! provider = "openai"
//! temperature = 0.7
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use mailrag_core::tasks::{TaskSettings, MAX_SUGGESTIONS};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// `"file"` or `"gmail"`.
    #[serde(default = "default_mail_source")]
    pub source: String,
    /// JSON array of email records, for the `file` source. Relative paths
    /// resolve against the config file's directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            source: default_mail_source(),
            path: None,
            query: String::new(),
            max_results: default_max_results(),
            token_env: default_token_env(),
        }
    }
}

fn default_mail_source() -> String {
    "file".to_string()
}
fn default_max_results() -> usize {
    50
}
fn default_token_env() -> String {
    "GMAIL_ACCESS_TOKEN".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (Ollama).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_disabled() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    /// Falls back to the provider's default model.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Overrides the provider's default API key variable.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// No request timeout unless set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: None,
            url: None,
            timeout_secs: None,
        }
    }
}

impl GenerationConfig {
    /// Configured model, or the provider's default.
    pub fn model_name(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "openai" => "gpt-4o",
            "anthropic" => "claude-3-sonnet-20240229",
            "gemini" => "gemini-2.5-flash",
            "grok" => "grok-1.5",
            "ollama" => "llama3.2",
            _ => "",
        }
        .to_string()
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_var(&self) -> Option<String> {
        if let Some(var) = &self.api_key_env {
            return Some(var.clone());
        }
        match self.provider.as_str() {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "gemini" => Some("GEMINI_API_KEY"),
            "grok" => Some("GROK_API_KEY"),
            _ => None,
        }
        .map(str::to_string)
    }
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_answer_top_k")]
    pub answer_top_k: usize,
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,
    #[serde(default = "default_five")]
    pub suggestion_seed: usize,
    #[serde(default = "default_five")]
    pub max_suggestions: usize,
    #[serde(default = "default_categorize_body_chars")]
    pub categorize_body_chars: usize,
    #[serde(default = "default_analytics_limit")]
    pub analytics_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            answer_top_k: default_answer_top_k(),
            search_top_k: default_search_top_k(),
            suggestion_seed: default_five(),
            max_suggestions: default_five(),
            categorize_body_chars: default_categorize_body_chars(),
            analytics_limit: default_analytics_limit(),
        }
    }
}

impl RetrievalConfig {
    pub fn task_settings(&self) -> TaskSettings {
        TaskSettings {
            answer_top_k: self.answer_top_k,
            search_top_k: self.search_top_k,
            suggestion_seed: self.suggestion_seed,
            max_suggestions: self.max_suggestions,
            categorize_body_chars: self.categorize_body_chars,
        }
    }
}

fn default_answer_top_k() -> usize {
    5
}
fn default_search_top_k() -> usize {
    10
}
fn default_five() -> usize {
    5
}
fn default_categorize_body_chars() -> usize {
    500
}
fn default_analytics_limit() -> usize {
    30
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Resolve mail path relative to the config file
    if let Some(mail_path) = &config.mail.path {
        if mail_path.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.mail.path = Some(base.join(mail_path));
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Mail
    match config.mail.source.as_str() {
        "file" => {
            if config.mail.path.is_none() {
                bail!("mail.path must be set when mail.source is 'file'");
            }
        }
        "gmail" => {}
        other => bail!("Unknown mail source: '{}'. Must be file or gmail.", other),
    }
    if config.mail.max_results == 0 {
        bail!("mail.max_results must be > 0");
    }

    // Embedding
    let embedding = &config.embedding;
    match embedding.provider.as_str() {
        "disabled" | "hashed" | "local" => {}
        "openai" | "ollama" => {
            if embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    embedding.provider
                );
            }
            if embedding.dims.is_none() {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, hashed, openai, ollama, or local.",
            other
        ),
    }
    if embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0");
    }
    if embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    // Generation
    let generation = &config.generation;
    match generation.provider.as_str() {
        "disabled" | "openai" | "anthropic" | "gemini" | "grok" | "ollama" => {}
        other => bail!(
            "Unknown generation provider: '{}'. Must be disabled, openai, anthropic, gemini, grok, or ollama.",
            other
        ),
    }
    if !(0.0..=2.0).contains(&generation.temperature) {
        bail!("generation.temperature must be in [0.0, 2.0]");
    }
    if generation.max_tokens == 0 {
        bail!("generation.max_tokens must be > 0");
    }

    // Retrieval
    let r = &config.retrieval;
    for (name, value) in [
        ("answer_top_k", r.answer_top_k),
        ("search_top_k", r.search_top_k),
        ("suggestion_seed", r.suggestion_seed),
        ("max_suggestions", r.max_suggestions),
        ("categorize_body_chars", r.categorize_body_chars),
        ("analytics_limit", r.analytics_limit),
    ] {
        if value < 1 {
            bail!("retrieval.{} must be >= 1", name);
        }
    }
    for (name, value) in [
        ("suggestion_seed", r.suggestion_seed),
        ("max_suggestions", r.max_suggestions),
    ] {
        if value > MAX_SUGGESTIONS {
            bail!("retrieval.{} must be <= {}", name, MAX_SUGGESTIONS);
        }
    }

    Ok(())
}

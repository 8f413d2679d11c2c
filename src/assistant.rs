//! Wiring from configuration to a ready [`EmailAssistant`] and its inputs.
//!
//! Commands call [`build_assistant`] once, then load their working set
//! through the configured mail store.

use anyhow::{Context, Result};

use mailrag_core::models::EmailRecord;
use mailrag_core::tasks::EmailAssistant;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::generation::{create_generator, generation_params};
use crate::mail_store::{fetch_emails, open_store, MessageHandle};

/// Working-set selection from the command line.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Overrides `mail.query`.
    pub query: Option<String>,
    /// Overrides `mail.max_results`.
    pub limit: Option<usize>,
}

pub fn build_assistant(config: &Config) -> Result<EmailAssistant> {
    let embedder = create_provider(&config.embedding)
        .context("Failed to initialize embedding provider")?;
    let generator = create_generator(&config.generation)
        .context("Failed to initialize generation provider")?;
    Ok(
        EmailAssistant::new(embedder, generator, generation_params(&config.generation))
            .with_settings(config.retrieval.task_settings()),
    )
}

/// Fetch the emails the command will work on.
pub async fn load_working_set(config: &Config, selection: &Selection) -> Result<Vec<EmailRecord>> {
    let store = open_store(&config.mail)?;
    let query = selection.query.as_deref().unwrap_or(&config.mail.query);
    let limit = selection.limit.unwrap_or(config.mail.max_results);
    fetch_emails(store.as_ref(), query, limit).await
}

/// Fetch one email by id.
pub async fn find_email(config: &Config, id: &str) -> Result<EmailRecord> {
    let store = open_store(&config.mail)?;
    let handle = MessageHandle {
        id: id.to_string(),
        thread_id: String::new(),
    };
    store.get_message(&handle).await
}

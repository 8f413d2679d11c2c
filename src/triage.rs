//! Single-email commands: summarize, categorize, action items, sentiment,
//! and reply.

use anyhow::{bail, Result};

use mailrag_core::analytics::extract_sender_address;
use mailrag_core::categorize::parse_categorization;
use mailrag_core::generation::is_apology;
use mailrag_core::prompts::ReplyTone;

use crate::assistant::{build_assistant, find_email};
use crate::config::Config;
use crate::mail_store::open_store;

/// Which single-email task to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTask {
    Summarize,
    Categorize,
    ActionItems,
    Sentiment,
}

pub async fn run_email_task(config: &Config, id: &str, task: EmailTask) -> Result<()> {
    let assistant = build_assistant(config)?;
    let email = find_email(config, id).await?;

    let output = match task {
        EmailTask::Summarize => assistant.summarize(&email).await,
        EmailTask::Categorize => {
            let response = assistant.categorize(&email).await;
            match parse_categorization(&response) {
                Some(parsed) => parsed.render(),
                None => response,
            }
        }
        EmailTask::ActionItems => assistant.extract_action_items(&email).await,
        EmailTask::Sentiment => assistant.analyze_sentiment(&email).await,
    };
    println!("{}", output);
    Ok(())
}

/// Draft a reply; with `send`, deliver it in the original thread.
pub async fn run_reply(config: &Config, id: &str, tone: ReplyTone, send: bool) -> Result<()> {
    let assistant = build_assistant(config)?;
    let email = find_email(config, id).await?;
    let reply = assistant.generate_reply(&email, tone).await;
    println!("{}", reply);

    if !send {
        return Ok(());
    }
    if is_apology(&reply) {
        bail!("Reply generation failed; nothing was sent");
    }

    let store = open_store(&config.mail)?;
    let to = extract_sender_address(&email.sender);
    store
        .send_reply(&email.thread_id, &to, &email.subject, &reply)
        .await?;
    eprintln!("Reply sent to {}.", to);
    Ok(())
}

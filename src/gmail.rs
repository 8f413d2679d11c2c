//! Gmail REST mail store.
//!
//! Talks to `https://gmail.googleapis.com/gmail/v1/users/me` with a bearer
//! token read from the environment. Obtaining and refreshing that token
//! (OAuth consent flow) is outside this crate.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;

use mailrag_core::models::EmailRecord;

use crate::mail_store::{MailStore, MessageHandle};

const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

pub struct GmailStore {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl GmailStore {
    pub fn new(base_url: impl Into<String>, token: String) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Read the access token from `token_env`.
    pub fn from_env(token_env: &str) -> Result<Self> {
        let token = std::env::var(token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .with_context(|| format!("{} environment variable not set", token_env))?;
        Ok(Self::new(GMAIL_API, token))
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Gmail request failed: {}", url))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gmail API error {}: {}", status, body);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailStore for GmailStore {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<MessageHandle>> {
        let json = self
            .get_json(
                &format!("{}/messages", self.base_url),
                &[
                    ("q", query.to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;
        Ok(parse_message_list(&json))
    }

    async fn get_message(&self, handle: &MessageHandle) -> Result<EmailRecord> {
        let json = self
            .get_json(
                &format!("{}/messages/{}", self.base_url, handle.id),
                &[("format", "full".to_string())],
            )
            .await?;
        extract_email_record(&json)
    }

    async fn send_reply(&self, thread_id: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        let raw = URL_SAFE.encode(build_reply_message(thread_id, to, subject, body));
        let response = self
            .client
            .post(format!("{}/messages/send", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({"raw": raw, "threadId": thread_id}))
            .send()
            .await
            .context("Gmail send request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gmail API error {}: {}", status, body);
        }
        tracing::info!(thread_id, to, "reply sent");
        Ok(())
    }
}

fn parse_message_list(json: &Value) -> Vec<MessageHandle> {
    json.get("messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| {
                    Some(MessageHandle {
                        id: m.get("id")?.as_str()?.to_string(),
                        thread_id: m
                            .get("threadId")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Convert a `format=full` Gmail message into an [`EmailRecord`].
///
/// Headers are looked up by exact name. The body is the first `text/plain`
/// part found depth-first, else the first `text/html` part, else empty.
pub fn extract_email_record(message: &Value) -> Result<EmailRecord> {
    let id = message
        .get("id")
        .and_then(Value::as_str)
        .context("Gmail message has no id")?;
    static EMPTY: Value = Value::Null;
    let payload = message.get("payload").unwrap_or(&EMPTY);

    Ok(EmailRecord {
        id: id.to_string(),
        subject: header(payload, "Subject").unwrap_or("No Subject").to_string(),
        sender: header(payload, "From").unwrap_or("Unknown Sender").to_string(),
        date: header(payload, "Date").unwrap_or("Unknown Date").to_string(),
        body: extract_body(payload),
        thread_id: message
            .get("threadId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn header<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload
        .get("headers")?
        .as_array()?
        .iter()
        .find(|h| h.get("name").and_then(Value::as_str) == Some(name))?
        .get("value")?
        .as_str()
}

fn extract_body(payload: &Value) -> String {
    find_part_data(payload, "text/plain")
        .or_else(|| find_part_data(payload, "text/html"))
        .and_then(|data| decode_base64url(data).ok())
        .unwrap_or_default()
}

/// Depth-first search for the first part of `mime_type` carrying data.
fn find_part_data<'a>(part: &'a Value, mime_type: &str) -> Option<&'a str> {
    if let Some(parts) = part.get("parts").and_then(Value::as_array) {
        return parts.iter().find_map(|p| find_part_data(p, mime_type));
    }
    if part.get("mimeType").and_then(Value::as_str) != Some(mime_type) {
        return None;
    }
    part.pointer("/body/data").and_then(Value::as_str)
}

/// Decode base64url with or without padding; invalid UTF-8 is replaced.
pub fn decode_base64url(data: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim().trim_end_matches('='))
        .context("Invalid base64url body")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// RFC 822 reply text for `messages/send`.
pub fn build_reply_message(thread_id: &str, to: &str, subject: &str, body: &str) -> String {
    let subject = if subject.to_ascii_lowercase().starts_with("re:") {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    };
    format!(
        "To: {to}\r\nSubject: {subject}\r\nIn-Reply-To: {thread_id}\r\nReferences: {thread_id}\r\n\r\n{body}"
    )
}

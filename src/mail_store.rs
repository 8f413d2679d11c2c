//! Mail store abstraction.
//!
//! A [`MailStore`] lists message handles for a query and resolves a handle
//! into an [`EmailRecord`]. The retrieval core only ever sees the resulting
//! records; how they were fetched stays here.
//!
//! | `mail.source` | Store |
//! |---------------|-------|
//! | `"file"` | [`JsonFileStore`] |
//! | `"gmail"` | [`GmailStore`](crate::gmail::GmailStore) |

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use mailrag_core::models::EmailRecord;

use crate::config::MailConfig;
use crate::gmail::GmailStore;

/// Opaque reference to a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub id: String,
    pub thread_id: String,
}

#[async_trait]
pub trait MailStore: Send + Sync {
    /// Store name for logs (e.g. `"file"`, `"gmail"`).
    fn name(&self) -> &str;

    /// Up to `max_results` handles matching `query`, newest or file order.
    async fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<MessageHandle>>;

    async fn get_message(&self, handle: &MessageHandle) -> Result<EmailRecord>;

    /// Send `body` as a reply in `thread_id`.
    async fn send_reply(&self, thread_id: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        let _ = (thread_id, to, subject, body);
        bail!("mail source '{}' cannot send replies", self.name())
    }
}

/// List and resolve up to `max_results` emails matching `query`.
pub async fn fetch_emails(
    store: &dyn MailStore,
    query: &str,
    max_results: usize,
) -> Result<Vec<EmailRecord>> {
    let handles = store.list_messages(query, max_results).await?;
    let mut emails = Vec::with_capacity(handles.len());
    for handle in &handles {
        emails.push(
            store
                .get_message(handle)
                .await
                .with_context(|| format!("Failed to fetch message {}", handle.id))?,
        );
    }
    tracing::debug!(store = store.name(), query, count = emails.len(), "fetched emails");
    Ok(emails)
}

/// Build the store named by `config.source`.
pub fn open_store(config: &MailConfig) -> Result<Box<dyn MailStore>> {
    match config.source.as_str() {
        "file" => {
            let path = config
                .path
                .as_ref()
                .context("mail.path required for the file source")?;
            Ok(Box::new(JsonFileStore::open(path)?))
        }
        "gmail" => Ok(Box::new(GmailStore::from_env(&config.token_env)?)),
        other => bail!("Unknown mail source: {}", other),
    }
}

// ============ JSON file store ============

/// Emails read from a JSON array of records.
///
/// Accepts `thread_id` or `threadId`. Queries are matched loosely: each
/// term is looked up case-insensitively in subject, sender, and body, and an
/// email matches when any term does. Gmail operators (`OR`, `AND`,
/// `field:` prefixes, parentheses, quotes) are stripped, not interpreted.
pub struct JsonFileStore {
    path: PathBuf,
    emails: Vec<EmailRecord>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mailbox file: {}", path.display()))?;
        let emails: Vec<EmailRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse mailbox file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            emails,
        })
    }

    pub fn from_emails(emails: Vec<EmailRecord>) -> Self {
        Self {
            path: PathBuf::new(),
            emails,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MailStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<MessageHandle>> {
        let terms = query_terms(query);
        Ok(self
            .emails
            .iter()
            .filter(|email| terms.is_empty() || matches_any(email, &terms))
            .take(max_results)
            .map(|email| MessageHandle {
                id: email.id.clone(),
                thread_id: email.thread_id.clone(),
            })
            .collect())
    }

    async fn get_message(&self, handle: &MessageHandle) -> Result<EmailRecord> {
        self.emails
            .iter()
            .find(|email| email.id == handle.id)
            .cloned()
            .with_context(|| format!("No email with id '{}'", handle.id))
    }
}

/// Lower-cased search terms with Gmail operators removed.
fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|token| !matches!(*token, "OR" | "AND"))
        .map(|token| {
            let token = token.trim_matches(|c| matches!(c, '(' | ')' | '"' | '{' | '}'));
            let token = match token.split_once(':') {
                Some((_, value)) => value,
                None => token,
            };
            token
                .trim_matches(|c| matches!(c, '(' | ')' | '"'))
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn matches_any(email: &EmailRecord, terms: &[String]) -> bool {
    let haystack = format!("{}\n{}\n{}", email.subject, email.sender, email.body).to_lowercase();
    terms.iter().any(|term| haystack.contains(term.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str, subject: &str, sender: &str, body: &str) -> EmailRecord {
        EmailRecord {
            id: id.into(),
            subject: subject.into(),
            sender: sender.into(),
            date: "Mon, 8 Jan 2024".into(),
            body: body.into(),
            thread_id: format!("t{id}"),
        }
    }

    fn store() -> JsonFileStore {
        JsonFileStore::from_emails(vec![
            email("1", "Team meeting", "boss@corp.com", "Agenda attached"),
            email("2", "New job opportunity", "jobs@linkedin.com", "We are hiring"),
            email("3", "Weekly digest", "news@site.com", "Top stories"),
        ])
    }

    #[test]
    fn test_query_terms_strip_operators() {
        assert_eq!(
            query_terms("from:(linkedin.com OR indeed.com) OR subject:(job)"),
            vec!["linkedin.com", "indeed.com", "job"]
        );
        assert!(query_terms("  ").is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_lists_all_in_order() {
        let handles = store().list_messages("", 10).await.unwrap();
        let ids: Vec<&str> = handles.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_query_matches_any_term_and_limits() {
        let s = store();
        let handles = s
            .list_messages("subject:(meeting OR call OR zoom OR teams)", 10)
            .await
            .unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].id, "1");

        let handles = s.list_messages("meeting digest", 1).await.unwrap();
        assert_eq!(handles.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_emails_resolves_records() {
        let s = store();
        let emails = fetch_emails(&s, "linkedin", 5).await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "New job opportunity");
    }

    #[tokio::test]
    async fn test_file_store_cannot_send() {
        let err = store().send_reply("t1", "a@b.c", "Hi", "body").await.unwrap_err();
        assert!(err.to_string().contains("cannot send replies"));
    }

    #[test]
    fn test_open_reads_camel_case_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("inbox.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","subject":"Hi","sender":"x@y.z","date":"d","body":"b","threadId":"ta"}]"#,
        )
        .unwrap();
        let s = JsonFileStore::open(&path).unwrap();
        assert_eq!(s.emails[0].thread_id, "ta");
        assert_eq!(s.path(), path.as_path());
    }
}

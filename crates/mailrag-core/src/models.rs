//! Core data models shared by the retrieval and orchestration layers.

use serde::{Deserialize, Serialize};

/// A single email message as supplied by a mail store.
///
/// The core never parses `date`; it is carried in whatever format the
/// provider returned. `body` may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, alias = "threadId")]
    pub thread_id: String,
}

impl EmailRecord {
    /// The text handed to the embedding encoder for this email.
    pub fn embedding_text(&self) -> String {
        format!("Subject: {}\nBody: {}", self.subject, self.body)
    }
}

/// One question/answer exchange in a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub question: String,
    pub answer: String,
}

//! Chat session snapshot.
//!
//! A [`ChatSession`] holds the emails loaded for chat and the question and
//! answer history. It is a plain value: [`ChatSession::ask`] consumes a
//! snapshot and returns the updated one, so the caller decides where the
//! session lives between turns.

use serde::{Deserialize, Serialize};

use crate::models::{ChatHistoryEntry, EmailRecord};
use crate::retriever::RetrievalError;
use crate::tasks::EmailAssistant;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(default)]
    pub history: Vec<ChatHistoryEntry>,
    #[serde(default)]
    pub loaded_emails: Vec<EmailRecord>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded emails, keeping the history.
    pub fn with_emails(mut self, emails: Vec<EmailRecord>) -> Self {
        self.loaded_emails = emails;
        self
    }

    /// Drop both the loaded emails and the history.
    pub fn clear(self) -> Self {
        Self::default()
    }

    /// Remove the history entry at `index`; out-of-range is a no-op.
    pub fn remove_entry(mut self, index: usize) -> Self {
        if index < self.history.len() {
            self.history.remove(index);
        }
        self
    }

    /// Answer `question` over the loaded emails.
    ///
    /// The exchange is recorded only when emails are loaded; otherwise the
    /// guidance text is returned and the history is left untouched.
    pub async fn ask(
        mut self,
        assistant: &EmailAssistant,
        question: &str,
    ) -> Result<(Self, String), RetrievalError> {
        let answer = assistant
            .answer_question(question, &self.loaded_emails)
            .await?;
        if !self.loaded_emails.is_empty() {
            self.history.push(ChatHistoryEntry {
                question: question.to_string(),
                answer: answer.clone(),
            });
        }
        Ok((self, answer))
    }
}

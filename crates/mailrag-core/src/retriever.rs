//! Embedding-backed retrieval over a working set of emails.
//!
//! A [`Retriever`] pairs an [`EmbeddingProvider`] with a [`FlatIndex`] and
//! the email slice the index was built from. Index and vectors are always
//! rebuilt together by [`index_emails`](Retriever::index_emails), so a
//! search never mixes vectors from different encoder runs.
//!
//! A retriever borrows its emails and is meant to live for a single
//! request; concurrent requests each build their own.

use std::sync::Arc;

use thiserror::Error;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::index::{FlatIndex, IndexError};
use crate::models::EmailRecord;

/// Structural retrieval failures. These are surfaced, never absorbed.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("encoding unavailable: {0}")]
    EncodingUnavailable(#[from] EmbeddingError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

enum IndexState<'a> {
    Unset,
    Ready {
        index: FlatIndex,
        emails: &'a [EmailRecord],
    },
}

pub struct Retriever<'a> {
    provider: Arc<dyn EmbeddingProvider>,
    state: IndexState<'a>,
}

impl<'a> Retriever<'a> {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            state: IndexState::Unset,
        }
    }

    /// Number of emails in the current index (`0` when unset).
    pub fn len(&self) -> usize {
        match &self.state {
            IndexState::Unset => 0,
            IndexState::Ready { index, .. } => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the index over `emails`, discarding any previous state.
    ///
    /// Each email is encoded from its [`EmailRecord::embedding_text`]. An
    /// empty slice leaves a valid empty index without calling the encoder.
    pub async fn index_emails(&mut self, emails: &'a [EmailRecord]) -> Result<(), RetrievalError> {
        self.state = IndexState::Unset;

        let vectors = if emails.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = emails.iter().map(EmailRecord::embedding_text).collect();
            let vectors = self.provider.embed(&texts).await?;
            if vectors.len() != emails.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: emails.len(),
                    got: vectors.len(),
                }
                .into());
            }
            vectors
        };

        let index = FlatIndex::build(vectors)?;
        tracing::debug!(
            emails = emails.len(),
            dims = index.dims(),
            model = self.provider.model_name(),
            "built email index"
        );
        self.state = IndexState::Ready { index, emails };
        Ok(())
    }

    /// Return up to `k` emails nearest to `query`, nearest first.
    ///
    /// An unset or empty index yields an empty result without encoding the
    /// query.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<&'a EmailRecord>, RetrievalError> {
        let (index, emails) = match &self.state {
            IndexState::Ready { index, emails } if !index.is_empty() => (index, *emails),
            _ => return Ok(Vec::new()),
        };

        let k = k.min(index.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.provider.embed_one(query).await?;
        let hits = index.search(&query_vec, k)?;
        Ok(hits.iter().map(|hit| &emails[hit.position]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{DisabledProvider, HashedProvider};

    fn email(id: &str, subject: &str, body: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            subject: subject.to_string(),
            sender: "someone@example.com".to_string(),
            date: "Tue, 2 Jan 2024 10:00:00 +0000".to_string(),
            body: body.to_string(),
            thread_id: format!("t{}", id),
        }
    }

    fn inbox() -> Vec<EmailRecord> {
        vec![
            email("1", "Invoice overdue", "Your invoice 442 is overdue, please pay"),
            email("2", "Meeting tomorrow", "Let's meet at 3pm in room B"),
            email("3", "Weekly newsletter", "Top stories this week in rust"),
            email("4", "Flight booking", "Your flight to Lisbon is confirmed"),
        ]
    }

    fn hashed() -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashedProvider::new(128))
    }

    #[tokio::test]
    async fn test_unset_search_is_empty() {
        let retriever = Retriever::new(hashed());
        assert!(retriever.search("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_search_is_empty() {
        let mut retriever = Retriever::new(hashed());
        retriever.index_emails(&[]).await.unwrap();
        assert_eq!(retriever.len(), 0);
        assert!(retriever.search("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_result_len_is_min_of_k_and_n() {
        let emails = inbox();
        let mut retriever = Retriever::new(hashed());
        retriever.index_emails(&emails).await.unwrap();
        for k in 0..8 {
            let hits = retriever.search("meeting", k).await.unwrap();
            assert_eq!(hits.len(), k.min(emails.len()));
        }
    }

    #[tokio::test]
    async fn test_single_email_scenario() {
        let emails = vec![email("1", "Meeting tomorrow", "Let's meet at 3pm")];
        let mut retriever = Retriever::new(hashed());
        retriever.index_emails(&emails).await.unwrap();
        let hits = retriever.search("when is the meeting", 1).await.unwrap();
        assert_eq!(hits, vec![&emails[0]]);
    }

    #[tokio::test]
    async fn test_relevant_email_ranks_first() {
        let emails = inbox();
        let mut retriever = Retriever::new(hashed());
        retriever.index_emails(&emails).await.unwrap();
        let hits = retriever.search("flight to Lisbon", 2).await.unwrap();
        assert_eq!(hits[0].id, "4");
    }

    #[tokio::test]
    async fn test_reindexing_is_idempotent() {
        let emails = inbox();
        let mut retriever = Retriever::new(hashed());
        retriever.index_emails(&emails).await.unwrap();
        let first: Vec<String> = retriever
            .search("overdue invoice", 4)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect();
        retriever.index_emails(&emails).await.unwrap();
        let second: Vec<String> = retriever
            .search("overdue invoice", 4)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_state() {
        let emails = inbox();
        let mut retriever = Retriever::new(hashed());
        retriever.index_emails(&emails).await.unwrap();
        retriever.index_emails(&emails[..1]).await.unwrap();
        assert_eq!(retriever.len(), 1);
        assert_eq!(retriever.search("flight", 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_encoder_outage_is_surfaced() {
        let emails = inbox();
        let mut retriever = Retriever::new(Arc::new(DisabledProvider));
        let err = retriever.index_emails(&emails).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EncodingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_disabled_encoder_with_no_emails_is_fine() {
        let mut retriever = Retriever::new(Arc::new(DisabledProvider));
        retriever.index_emails(&[]).await.unwrap();
        assert!(retriever.search("q", 3).await.unwrap().is_empty());
    }
}

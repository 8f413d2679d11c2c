//! Embedding provider trait and the providers that need no I/O.
//!
//! Defines the [`EmbeddingProvider`] trait that every encoder backend
//! implements. Network and model-backed providers (OpenAI, Ollama,
//! fastembed, tract) live in the `mailrag` app crate; this module only
//! carries the pure ones:
//!
//! - **[`DisabledProvider`]**: fails every call with
//!   [`EmbeddingError::ModelUnavailable`].
//! - **[`HashedProvider`]**: deterministic feature-hashing encoder for
//!   tests and offline use.

use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by an embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The underlying model could not be loaded or run.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
    /// The provider returned a different number of vectors than inputs.
    #[error("embedding provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

/// Trait for embedding providers.
///
/// Implementations must be deterministic for a fixed model: the same text
/// always yields the same vector. [`embed`](EmbeddingProvider::embed) is
/// order-preserving and returns exactly one vector per input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                got: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }
}

/// A provider that always fails.
///
/// Used when `embedding.provider = "disabled"`. Retrieval surfaces the
/// error instead of silently returning nothing.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::ModelUnavailable(
            "embedding provider is disabled".to_string(),
        ))
    }
}

/// Deterministic bag-of-words encoder based on feature hashing.
///
/// Each lower-cased alphanumeric token is hashed with FNV-1a into one of
/// `dims` buckets with a sign taken from the top hash bit, then the vector
/// is L2-normalised. Texts sharing words land close together, which is
/// enough for lexical retrieval without a model download.
pub struct HashedProvider {
    dims: usize,
}

impl HashedProvider {
    pub const MODEL_NAME: &'static str = "hashed";

    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    /// Encode one text synchronously.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dims as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashedProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashedProvider {
    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashed_is_deterministic() {
        let p = HashedProvider::new(64);
        assert_eq!(p.encode("Quarterly budget review"), p.encode("Quarterly budget review"));
    }

    #[test]
    fn test_hashed_is_case_insensitive() {
        let p = HashedProvider::new(64);
        assert_eq!(p.encode("Meeting"), p.encode("meeting"));
    }

    #[test]
    fn test_hashed_is_unit_length() {
        let p = HashedProvider::new(32);
        let v = p.encode("some words in a sentence");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashed_empty_text_is_zero_vector() {
        let p = HashedProvider::new(16);
        assert!(p.encode("  ,, ").iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_hashed_batch_preserves_order() {
        let p = HashedProvider::new(64);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let out = p.embed(&texts).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], p.encode("alpha"));
        assert_eq!(out[1], p.encode("beta"));
    }

    #[tokio::test]
    async fn test_disabled_fails_with_model_unavailable() {
        let err = DisabledProvider.embed_one("hi").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelUnavailable(_)));
    }
}

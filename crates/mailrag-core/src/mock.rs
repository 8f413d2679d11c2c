//! Scripted generator for tests.
//!
//! [`MockGenerator`] returns queued responses in order, then a default
//! response, and records every prompt it receives so tests can assert on
//! call counts and prompt contents without a network backend.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::generation::{GenerationError, GenerationParams, Generator};

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub prompt: String,
    pub params: GenerationParams,
}

pub struct MockGenerator {
    queued: Mutex<VecDeque<String>>,
    default_response: String,
    failure: Option<String>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_response: "This is a mock response.".to_string(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default_response(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            ..Self::new()
        }
    }

    /// A generator whose every call fails with a provider error carrying
    /// `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Queue a response for the next unanswered call.
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queued).push_back(response.into());
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        lock(&self.calls).push(MockCall {
            prompt: prompt.to_string(),
            params: params.clone(),
        });

        if let Some(message) = &self.failure {
            return Err(GenerationError::provider("mock", message.clone()));
        }

        Ok(lock(&self.queued)
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

// Ignores poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_default() {
        let mock = MockGenerator::with_default_response("fallback");
        mock.push_response("first");
        let params = GenerationParams::default();
        assert_eq!(mock.generate("a", &params).await.unwrap(), "first");
        assert_eq!(mock.generate("b", &params).await.unwrap(), "fallback");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls()[1].prompt, "b");
    }

    #[tokio::test]
    async fn test_failing_records_calls() {
        let mock = MockGenerator::failing("offline");
        let err = mock
            .generate("x", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert_eq!(mock.call_count(), 1);
    }
}

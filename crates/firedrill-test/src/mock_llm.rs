//! Scripted LLM provider for deterministic narration tests.
//!
//! Tests queue turns up front; each `complete` call pops the next one and
//! records what it was asked.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use firedrill_llm::{LlmError, LlmProvider, LlmResponse, LlmResult, Message};

// ---------------------------------------------------------------------------
// MockLlmTurn
// ---------------------------------------------------------------------------

/// One scripted response.
#[derive(Debug, Clone)]
pub enum MockLlmTurn {
    /// Answer with text.
    Text(String),
    /// Fail with a request error.
    Error(String),
    /// Fail as an unavailable backend.
    Unavailable,
    /// Sleep, then answer with text.
    Delayed {
        /// How long to sleep first.
        delay: Duration,
        /// Text returned after the delay.
        text: String,
    },
}

impl MockLlmTurn {
    /// Convenience constructor for a text turn.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Convenience constructor for an error turn.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Convenience constructor for a delayed turn.
    #[must_use]
    pub fn delayed(delay: Duration, text: impl Into<String>) -> Self {
        Self::Delayed {
            delay,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MockCall
// ---------------------------------------------------------------------------

/// Everything one `complete` call was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// System prompt.
    pub system: String,
    /// Conversation turns.
    pub messages: Vec<Message>,
    /// Token limit.
    pub max_tokens: u32,
}

impl MockCall {
    /// The last user turn, which carries the narration prompt.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == firedrill_llm::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

// ---------------------------------------------------------------------------
// MockLlmProvider
// ---------------------------------------------------------------------------

/// An [`LlmProvider`] that replays a scripted queue of turns.
///
/// Once the queue is exhausted every call gets the fallback turn, or an
/// unavailable error if there is none.
#[derive(Debug)]
pub struct MockLlmProvider {
    turns: Mutex<VecDeque<MockLlmTurn>>,
    fallback: Option<MockLlmTurn>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockLlmProvider {
    /// Create a provider that replays `turns` in order.
    #[must_use]
    pub fn new(turns: Vec<MockLlmTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that answers every call with the same text.
    #[must_use]
    pub fn repeating(text: impl Into<String>) -> Self {
        Self::new(Vec::new()).with_fallback(MockLlmTurn::Text(text.into()))
    }

    /// Create a provider whose backend is always unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(Vec::new()).with_fallback(MockLlmTurn::Unavailable)
    }

    /// Turn replayed once the scripted queue is empty.
    #[must_use]
    pub fn with_fallback(mut self, turn: MockLlmTurn) -> Self {
        self.fallback = Some(turn);
        self
    }

    /// Number of `complete` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock poisoned").len()
    }

    /// Every call made so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Scripted turns not yet consumed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn remaining_turns(&self) -> usize {
        self.turns.lock().expect("lock poisoned").len()
    }

    fn next_turn(&self, system: &str, messages: &[Message], max_tokens: u32) -> Option<MockLlmTurn> {
        self.calls.lock().expect("lock poisoned").push(MockCall {
            system: system.to_string(),
            messages: messages.to_vec(),
            max_tokens,
        });
        self.turns
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        max_tokens: u32,
    ) -> LlmResult<LlmResponse> {
        match self.next_turn(system, messages, max_tokens) {
            Some(MockLlmTurn::Text(text)) => Ok(LlmResponse::text(text)),
            Some(MockLlmTurn::Error(message)) => Err(LlmError::ApiRequestFailed(message)),
            Some(MockLlmTurn::Delayed { delay, text }) => {
                tokio::time::sleep(delay).await;
                Ok(LlmResponse::text(text))
            },
            Some(MockLlmTurn::Unavailable) | None => Err(LlmError::Unavailable(
                "mock provider has no scripted turn".to_string(),
            )),
        }
    }
}

//! Bounded-time generation with deterministic fallback.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use firedrill_core::{ChatMessage, MessageRole, Persona};
use firedrill_llm::{DisabledProvider, LlmProvider, Message};
use tracing::{debug, warn};

use crate::brief::IncidentBrief;
use crate::error::{NarrationError, NarrationResult};
use crate::persona::system_prompt;
use crate::prompt::NarrationRequest;

/// Default token limit per reply.
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Default time allowed for one generation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Default number of transcript entries sent as context.
pub const DEFAULT_HISTORY_MESSAGES: usize = 5;

/// Generation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarratorConfig {
    /// Token limit per reply.
    pub max_tokens: u32,
    /// Time allowed for one generation.
    pub timeout: Duration,
    /// Transcript entries sent as context.
    pub history_messages: usize,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            history_messages: DEFAULT_HISTORY_MESSAGES,
        }
    }
}

/// Where narration text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationSource {
    /// The language model.
    Generated,
    /// The static fallback.
    Fallback,
}

/// Text a persona says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    /// Speaker.
    pub persona: Persona,
    /// What they say.
    pub text: String,
    /// Generated or fallback.
    pub source: NarrationSource,
}

impl Narration {
    /// Transcript entry for the narration.
    #[must_use]
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.persona, self.text)
    }

    /// Whether the fallback was used.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == NarrationSource::Fallback
    }
}

/// Turns narration requests into persona text.
#[derive(Clone)]
pub struct Narrator {
    provider: Arc<dyn LlmProvider>,
    config: NarratorConfig,
}

impl fmt::Debug for Narrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Narrator")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("config", &self.config)
            .finish()
    }
}

impl Narrator {
    /// Create a narrator over a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: NarratorConfig) -> Self {
        Self { provider, config }
    }

    /// A narrator that always uses fallback text.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledProvider), NarratorConfig::default())
    }

    /// Generation limits.
    #[must_use]
    pub fn config(&self) -> &NarratorConfig {
        &self.config
    }

    /// Name of the backing provider.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Ask the model for the request's text.
    ///
    /// # Errors
    ///
    /// [`NarrationError::TimedOut`] past the configured timeout,
    /// [`NarrationError::Unavailable`] when there is no usable backend, and
    /// [`NarrationError::Failed`] for any other failure, including an empty
    /// reply.
    pub async fn generate(
        &self,
        request: &NarrationRequest,
        brief: &IncidentBrief,
        history: &[ChatMessage],
    ) -> NarrationResult<String> {
        let system = system_prompt(request.persona, brief);
        let messages = self.conversation(history, &request.prompt);

        let response = tokio::time::timeout(
            self.config.timeout,
            self.provider
                .complete(&system, &messages, self.config.max_tokens),
        )
        .await
        .map_err(|_elapsed| NarrationError::TimedOut(self.config.timeout))??;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(NarrationError::Failed("empty response".to_string()));
        }
        if let Some(usage) = response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "narration generated"
            );
        }
        Ok(text.to_string())
    }

    /// Generated text, or the request's fallback if generation fails.
    pub async fn narrate(
        &self,
        request: &NarrationRequest,
        brief: &IncidentBrief,
        history: &[ChatMessage],
    ) -> Narration {
        match self.generate(request, brief, history).await {
            Ok(text) => Narration {
                persona: request.persona,
                text,
                source: NarrationSource::Generated,
            },
            Err(e) => {
                match &e {
                    NarrationError::Unavailable(_) => {
                        debug!(
                            error = %e,
                            provider = self.provider.name(),
                            "narration backend unavailable, using fallback"
                        );
                    },
                    NarrationError::Failed(_) | NarrationError::TimedOut(_) => {
                        warn!(
                            error = %e,
                            provider = self.provider.name(),
                            "narration failed, using fallback"
                        );
                    },
                }
                Narration {
                    persona: request.persona,
                    text: request.fallback.clone(),
                    source: NarrationSource::Fallback,
                }
            },
        }
    }

    /// Transcript tail plus the prompt, without simulator banners.
    fn conversation(&self, history: &[ChatMessage], prompt: &str) -> Vec<Message> {
        let skip = history.len().saturating_sub(self.config.history_messages);
        history
            .iter()
            .skip(skip)
            .filter_map(|m| match m.role {
                MessageRole::User => Some(Message::user(m.content.clone())),
                MessageRole::Assistant => Some(Message::assistant(m.content.clone())),
                MessageRole::System => None,
            })
            .chain(std::iter::once(Message::user(prompt)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{chat, for_event};
    use firedrill_core::{Region, WorkflowEvent};
    use firedrill_llm::MessageRole as LlmRole;
    use firedrill_test::{MockLlmProvider, MockLlmTurn, fresh_session};

    fn request() -> (NarrationRequest, IncidentBrief) {
        let brief = IncidentBrief::from(&fresh_session());
        let event = WorkflowEvent::InvestigationStarted {
            region: Region::UsEast,
            required_patch: "6.5.0-10".into(),
        };
        (for_event(&event, &brief).unwrap(), brief)
    }

    fn narrator(provider: Arc<MockLlmProvider>) -> Narrator {
        Narrator::new(provider, NarratorConfig::default())
    }

    #[tokio::test]
    async fn generated_text_is_used() {
        let provider = Arc::new(MockLlmProvider::new(vec![MockLlmTurn::text(
            "  Found it: us-east needs 6.5.0-10.  ",
        )]));
        let (request, brief) = request();

        let narration = narrator(Arc::clone(&provider))
            .narrate(&request, &brief, &[])
            .await;

        assert_eq!(narration.source, NarrationSource::Generated);
        assert_eq!(narration.text, "Found it: us-east needs 6.5.0-10.");
        assert_eq!(narration.persona, Persona::Sre);

        let call = &provider.calls()[0];
        assert!(call.system.contains("experienced SRE"));
        assert_eq!(call.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(call.last_user_message(), Some(request.prompt.as_str()));
    }

    #[tokio::test]
    async fn unavailable_backend_falls_back() {
        let (request, brief) = request();
        let narration = Narrator::disabled().narrate(&request, &brief, &[]).await;
        assert!(narration.is_fallback());
        assert_eq!(narration.text, request.fallback);
    }

    #[tokio::test]
    async fn errors_and_empty_replies_fall_back() {
        let provider = Arc::new(MockLlmProvider::new(vec![
            MockLlmTurn::error("bad gateway"),
            MockLlmTurn::text("   "),
        ]));
        let narrator = narrator(provider);
        let (request, brief) = request();

        let err = narrator.generate(&request, &brief, &[]).await.unwrap_err();
        assert!(matches!(err, NarrationError::Failed(_)));
        let err = narrator.generate(&request, &brief, &[]).await.unwrap_err();
        assert!(matches!(err, NarrationError::Failed(m) if m == "empty response"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let provider = Arc::new(MockLlmProvider::new(vec![MockLlmTurn::delayed(
            Duration::from_secs(60),
            "too late",
        )]));
        let narrator = Narrator::new(
            provider,
            NarratorConfig {
                timeout: Duration::from_secs(2),
                ..NarratorConfig::default()
            },
        );
        let (request, brief) = request();

        let err = narrator.generate(&request, &brief, &[]).await.unwrap_err();
        assert!(matches!(err, NarrationError::TimedOut(d) if d == Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn history_is_trimmed_and_banners_skipped() {
        let provider = Arc::new(MockLlmProvider::repeating("ok"));
        let narrator = Narrator::new(
            Arc::clone(&provider) as Arc<dyn LlmProvider>,
            NarratorConfig {
                history_messages: 3,
                ..NarratorConfig::default()
            },
        );
        let history = vec![
            ChatMessage::user("old question"),
            ChatMessage::assistant(Persona::Sre, "old answer"),
            ChatMessage::system("banner"),
            ChatMessage::user("recent question"),
            ChatMessage::assistant(Persona::Sre, "recent answer"),
        ];
        let brief = IncidentBrief::from(&fresh_session());
        let request = chat(&brief, "and now?");

        narrator.narrate(&request, &brief, &history).await;

        let messages = &provider.calls()[0].messages;
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["recent question", "recent answer", "and now?"]);
        assert_eq!(messages[1].role, LlmRole::Assistant);
    }

    #[test]
    fn narration_becomes_assistant_message() {
        let message = Narration {
            persona: Persona::Security,
            text: "checked".into(),
            source: NarrationSource::Generated,
        }
        .into_message();
        assert_eq!(message.persona, Some(Persona::Security));
        assert_eq!(message.role, MessageRole::Assistant);
    }
}

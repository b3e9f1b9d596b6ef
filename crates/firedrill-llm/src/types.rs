//! Request and response types shared by all providers.

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions.
    System,
    /// The operator.
    User,
    /// The model.
    Assistant,
}

impl MessageRole {
    /// Wire name used by chat-completion APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: MessageRole,
    /// Text.
    pub content: String,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Token usage, when the provider reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens.
    pub input_tokens: usize,
    /// Output tokens.
    pub output_tokens: usize,
}

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// Generated text.
    pub text: String,
    /// Token usage, if reported.
    pub usage: Option<Usage>,
}

impl LlmResponse {
    /// Response with text and no usage figures.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Chat-completion style message list, system prompt first.
pub(crate) fn chat_messages(system: &str, messages: &[Message]) -> Vec<serde_json::Value> {
    let system = (!system.is_empty()).then(|| {
        serde_json::json!({ "role": "system", "content": system })
    });
    system
        .into_iter()
        .chain(
            messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content })),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_goes_first() {
        let out = chat_messages("be brief", &[Message::user("hi"), Message::assistant("hello")]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["role"], "system");
        assert_eq!(out[1]["content"], "hi");
        assert_eq!(out[2]["role"], "assistant");
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let out = chat_messages("", &[Message::user("hi")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["role"], "user");
    }
}

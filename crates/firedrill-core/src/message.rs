//! Chat transcript and command audit trail entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Narrative identity speaking in generated chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Site reliability lead. Speaks during triage, rollout and closure.
    Sre,
    /// Security auditor. Speaks during the security phase.
    Security,
}

impl Persona {
    /// Name shown next to chat lines.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sre => "SRE Lead",
            Self::Security => "Security Auditor",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The operator.
    User,
    /// A persona.
    Assistant,
    /// The simulator itself.
    System,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique id.
    pub id: Uuid,
    /// Author.
    pub role: MessageRole,
    /// Speaking persona for assistant entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    /// Text.
    pub content: String,
    /// When the entry was written.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, persona: Option<Persona>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            persona,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Operator message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, None, content)
    }

    /// Persona message.
    #[must_use]
    pub fn assistant(persona: Persona, content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, Some(persona), content)
    }

    /// Simulator message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, None, content)
    }
}

/// Kind of audited operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// A terminal command.
    Command,
    /// A free-form chat message.
    Chat,
    /// A hint request.
    Hint,
}

/// One entry in the command audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique id.
    pub id: Uuid,
    /// When the action was taken.
    pub timestamp: DateTime<Utc>,
    /// The command line as typed.
    pub command: String,
    /// Whether the command was accepted.
    pub success: bool,
    /// Kind of action.
    pub kind: ActionKind,
}

impl ActionRecord {
    /// Record an action taken now.
    #[must_use]
    pub fn new(kind: ActionKind, command: impl Into<String>, success: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            command: command.into(),
            success,
            kind,
        }
    }
}

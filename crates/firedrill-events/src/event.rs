//! Events pushed to connected observers.

use firedrill_core::{ChatMessage, SessionView, Severity};
use serde::{Deserialize, Serialize};

/// Everything an observer can receive.
///
/// Serialized with a `type` tag so clients can dispatch on it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// Full session state after a mutation or tick.
    StateUpdate {
        /// The client projection.
        state: Box<SessionView>,
    },
    /// A transcript entry.
    Message {
        /// The entry.
        message: ChatMessage,
    },
    /// A workflow milestone.
    Notification {
        /// Severity.
        severity: Severity,
        /// Text.
        message: String,
    },
    /// Simulator banner text.
    System {
        /// Text.
        content: String,
    },
}

impl SimEvent {
    /// State snapshot event.
    #[must_use]
    pub fn state(view: SessionView) -> Self {
        Self::StateUpdate {
            state: Box::new(view),
        }
    }

    /// Notification event.
    #[must_use]
    pub fn notification(severity: Severity, message: impl Into<String>) -> Self {
        Self::Notification {
            severity,
            message: message.into(),
        }
    }

    /// System banner event.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Wire tag of the event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateUpdate { .. } => "state_update",
            Self::Message { .. } => "message",
            Self::Notification { .. } => "notification",
            Self::System { .. } => "system",
        }
    }
}

impl From<ChatMessage> for SimEvent {
    fn from(message: ChatMessage) -> Self {
        Self::Message { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedrill_core::{IncidentSession, Persona, SeededRandom};

    #[test]
    fn tags_match_event_type() {
        let mut rng = SeededRandom::new(1);
        let session = IncidentSession::new(&mut rng, chrono::Utc::now());
        let events = [
            SimEvent::state(SessionView::from(&session)),
            SimEvent::from(ChatMessage::assistant(Persona::Sre, "on it")),
            SimEvent::notification(Severity::Warning, "careful"),
            SimEvent::system("welcome"),
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn notification_shape() {
        let json = serde_json::to_value(SimEvent::notification(Severity::Error, "boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "notification", "severity": "error", "message": "boom" })
        );
    }

    #[test]
    fn message_carries_persona() {
        let event = SimEvent::from(ChatMessage::assistant(Persona::Security, "checking"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["message"]["persona"], "security");
        assert_eq!(json["message"]["role"], "assistant");
    }
}

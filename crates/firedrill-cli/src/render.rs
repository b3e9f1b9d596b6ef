//! Terminal rendering of streamed events.

use firedrill_core::{IncidentPhase, MessageRole};
use firedrill_events::SimEvent;
use firedrill_runtime::CommandResult;

use crate::theme::Theme;

/// Turns events into printable lines.
///
/// State updates arrive on every tick; only phase changes are printed.
#[derive(Debug, Default)]
pub(crate) struct EventRenderer {
    last_phase: Option<IncidentPhase>,
}

impl EventRenderer {
    /// Text for an event, or `None` if it should not be printed.
    pub(crate) fn render(&mut self, event: &SimEvent) -> Option<String> {
        match event {
            SimEvent::StateUpdate { state } => {
                if self.last_phase == Some(state.phase) {
                    return None;
                }
                self.last_phase = Some(state.phase);
                Some(Theme::info(&format!(
                    "Phase: {} | health {}% | {}/{} servers patched",
                    state.phase, state.health_score, state.patched_servers, state.total_servers
                )))
            },
            SimEvent::Message { message } => match (message.role, message.persona) {
                (MessageRole::User, _) => None,
                (MessageRole::Assistant, Some(persona)) => {
                    Some(format!("{} {}", Theme::persona(persona), message.content))
                },
                (MessageRole::Assistant | MessageRole::System, _) => {
                    Some(Theme::dimmed(&message.content))
                },
            },
            SimEvent::Notification { severity, message } => {
                Some(Theme::notification(*severity, message))
            },
            SimEvent::System { content } => Some(format!(
                "{}\n{}\n{}",
                Theme::separator(),
                Theme::header(content),
                Theme::separator()
            )),
        }
    }
}

/// Text for a command result.
pub(crate) fn command_result(result: &CommandResult) -> String {
    if result.success {
        result.output.clone()
    } else {
        Theme::error(&result.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedrill_core::{ChatMessage, IncidentSession, Persona, SeededRandom, SessionView, Severity};

    fn view() -> SessionView {
        let session = IncidentSession::new(&mut SeededRandom::new(3), chrono::Utc::now());
        SessionView::from(&session)
    }

    #[test]
    fn state_updates_print_on_phase_change_only() {
        let mut renderer = EventRenderer::default();
        let event = SimEvent::state(view());

        let first = renderer.render(&event).unwrap();
        assert!(first.contains("Phase: triage"));
        assert!(renderer.render(&event).is_none());
    }

    #[test]
    fn operator_echo_is_suppressed() {
        let mut renderer = EventRenderer::default();
        assert!(
            renderer
                .render(&SimEvent::from(ChatMessage::user("hello")))
                .is_none()
        );

        let reply = renderer
            .render(&SimEvent::from(ChatMessage::assistant(
                Persona::Security,
                "Audit logs are clean.",
            )))
            .unwrap();
        assert!(reply.contains("Security Auditor"));
        assert!(reply.contains("Audit logs are clean."));
    }

    #[test]
    fn notifications_and_banners_render() {
        let mut renderer = EventRenderer::default();
        let line = renderer
            .render(&SimEvent::notification(Severity::Error, "Patch rollout failed"))
            .unwrap();
        assert!(line.contains("Patch rollout failed"));

        let banner = renderer.render(&SimEvent::system("Welcome")).unwrap();
        assert_eq!(banner.lines().count(), 3);
    }

    #[test]
    fn rejected_results_are_marked() {
        let ok = command_result(&CommandResult::ok("fine"));
        assert_eq!(ok, "fine");
        let rejected = command_result(&CommandResult::rejected("us-east is idle"));
        assert!(rejected.contains("us-east is idle"));
        assert_ne!(rejected, "us-east is idle");
    }
}

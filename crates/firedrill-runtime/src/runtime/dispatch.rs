//! Command dispatch against the locked session.

use std::fmt::Write as _;

use chrono::Utc;
use firedrill_core::catalog::{CVE, LOG_SERVICES};
use firedrill_core::event::format_duration;
use firedrill_core::{ChatMessage, IncidentSession, WorkflowEvent};

use super::SessionState;
use crate::command::{Command, CommandResult};
use crate::report;

/// Narration a command asks for beyond its workflow events.
pub(super) enum FollowUp {
    /// `alert security`.
    SecurityBriefing,
    /// Operator chat. `history` is the transcript tail before the question.
    Chat {
        text: String,
        history: Vec<ChatMessage>,
    },
}

/// What one command did to the session.
pub(super) struct Outcome {
    pub(super) result: CommandResult,
    pub(super) events: Vec<WorkflowEvent>,
    pub(super) messages: Vec<ChatMessage>,
    pub(super) follow_up: Option<FollowUp>,
    pub(super) reset: bool,
}

impl Outcome {
    fn ok(output: impl Into<String>) -> Self {
        Self::from_result(CommandResult::ok(output))
    }

    pub(super) fn rejected(output: impl Into<String>) -> Self {
        Self::from_result(CommandResult::rejected(output))
    }

    fn from_result(result: CommandResult) -> Self {
        Self {
            result,
            events: Vec::new(),
            messages: Vec::new(),
            follow_up: None,
            reset: false,
        }
    }

    fn with_events(mut self, events: Vec<WorkflowEvent>) -> Self {
        self.events = events;
        self
    }
}

impl SessionState {
    /// Apply a command. Exactly one transition per call.
    pub(super) fn dispatch(&mut self, command: &Command, history_len: usize) -> Outcome {
        match command {
            Command::Status => Outcome::ok(report::status(&self.session)),
            Command::Metrics { service } => Outcome::ok(report::metrics(&self.session, service)),
            Command::Logs { service, minutes } => {
                match report::logs(&self.session, service, *minutes) {
                    Some(text) => Outcome::ok(text),
                    None => Outcome::rejected(format!(
                        "Unknown log service '{service}'. Services: {}",
                        LOG_SERVICES.join(", ")
                    )),
                }
            },
            Command::Regions => Outcome::ok(report::regions(&self.session)),
            Command::Help => Outcome::ok(report::help()),
            Command::Hint => {
                let (number, text) = self.session.next_hint();
                Outcome::ok(format!("Hint #{number}: {text}"))
            },
            Command::Query { question } => self.ask(question, history_len),
            Command::Reset => {
                self.session = IncidentSession::new(self.rng.as_mut(), Utc::now());
                self.session.push_message(ChatMessage::system(reset_banner()));
                Outcome {
                    reset: true,
                    ..Outcome::ok(format!(
                        "Incident reset. A fresh {} incident has started.",
                        CVE.id
                    ))
                }
            },
            Command::AlertSre { region } => match self.session.investigate(*region) {
                Ok(event) => Outcome::ok(format!(
                    "Paged the SRE team about {region}.\n\nInvestigation started; findings will \
                     follow in chat."
                ))
                .with_events(vec![event]),
                Err(e) => Outcome::rejected(e.to_string()),
            },
            Command::AlertSecurity => match self.session.require_security_phase() {
                Ok(()) => Outcome {
                    follow_up: Some(FollowUp::SecurityBriefing),
                    ..Outcome::ok(
                        "Paged the Security Auditor. A briefing on outstanding checklist items \
                         will follow in chat.",
                    )
                },
                Err(e) => Outcome::rejected(e.to_string()),
            },
            Command::Broadcast { team, message } => {
                let body = if message.is_empty() {
                    String::new()
                } else {
                    format!("\n\nMessage: \"{message}\"")
                };
                Outcome::ok(format!(
                    "Alert sent to {}{body}\n\nStatus: Delivered to {} channel(s)",
                    team.name().to_uppercase(),
                    team.channels()
                ))
            },
            Command::Patch { region, version } => {
                match self.session.apply_patch(*region, version) {
                    Ok(event) => Outcome::ok(format!(
                        "Initiated kernel {version} rollout for {region}\n\nAffected servers: \
                         {}\n\nMonitoring for issues...",
                        region.servers()
                    ))
                    .with_events(vec![event]),
                    Err(e) => Outcome::rejected(e.to_string()),
                }
            },
            Command::Rollback { region } => match self.session.rollback(*region) {
                Ok(event) => Outcome::ok(format!(
                    "Rolling back the kernel in {region}\n\nRestoring the previous kernel on {} \
                     servers...",
                    region.servers()
                ))
                .with_events(vec![event]),
                Err(e) => Outcome::rejected(e.to_string()),
            },
            Command::Verify { region } => match self.session.verify_next_item(*region) {
                Ok(events) => Outcome::ok(verify_output(&events)).with_events(events),
                Err(e) => Outcome::rejected(e.to_string()),
            },
            Command::Resolve => match self.session.resolve(Utc::now()) {
                Ok(events) => Outcome::ok(resolve_output(&events)).with_events(events),
                Err(e) => Outcome::rejected(e.to_string()),
            },
        }
    }

    fn ask(&mut self, question: &str, history_len: usize) -> Outcome {
        let history = self.session.recent_messages(history_len).to_vec();
        let message = ChatMessage::user(question);
        self.session.push_message(message.clone());
        Outcome {
            messages: vec![message],
            follow_up: Some(FollowUp::Chat {
                text: question.to_string(),
                history,
            }),
            ..Outcome::ok(format!("Asked the {}.", self.session.ai_persona()))
        }
    }
}

/// System line announcing a fresh incident.
pub(super) fn reset_banner() -> String {
    format!("New incident opened: {}. Every region is exposed.", CVE.id)
}

fn verify_output(events: &[WorkflowEvent]) -> String {
    let mut out = String::new();
    for event in events {
        match event {
            WorkflowEvent::ItemVerified {
                region,
                description,
                finding,
                remaining,
            } => {
                let _ = write!(
                    out,
                    "Verified in {region}: {description}\nFinding: {finding}\n{remaining} item(s) \
                     remaining in {region}"
                );
            },
            WorkflowEvent::RegionVerified { region } => {
                let _ = write!(out, "\n\n{region} is fully verified.");
            },
            WorkflowEvent::AllVerified => {
                out.push_str("\nEvery region is verified. Run 'resolve' to close the incident.");
            },
            _ => {},
        }
    }
    out
}

fn resolve_output(events: &[WorkflowEvent]) -> String {
    let resolved = events.iter().find_map(|e| match e {
        WorkflowEvent::IncidentResolved { resolution_secs } => Some(*resolution_secs),
        _ => None,
    });
    if let Some(secs) = resolved {
        return format!("Incident resolved in {}.", format_duration(secs));
    }
    if events.contains(&WorkflowEvent::SreConfirmationRequested) {
        return "Closure requested. The SRE Lead is confirming; run 'resolve' again to close the \
                incident."
            .to_string();
    }
    "The incident is already resolved.".to_string()
}

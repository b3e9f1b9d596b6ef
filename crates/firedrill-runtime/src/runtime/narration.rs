//! Narration scheduled after a commit.
//!
//! Jobs for one commit run in order on a single task. Each result is applied
//! under the session lock only if the session it was requested for is still
//! live; a reset in between drops it.

use std::sync::Arc;

use firedrill_core::{ChatMessage, IncidentSession, Region, WorkflowEvent, WorkflowState};
use firedrill_events::SimEvent;
use firedrill_narration::{IncidentBrief, NarrationRequest, chat, for_event, security_briefing};
use tracing::debug;
use uuid::Uuid;

use super::Inner;

/// One piece of narration plus the transition it unblocks.
pub(super) struct NarrationJob {
    request: Option<NarrationRequest>,
    completes: Option<Region>,
}

impl NarrationJob {
    /// Jobs for the narrated events of a commit. An investigation always
    /// gets a job so it completes even without text.
    pub(super) fn for_events(events: &[WorkflowEvent], brief: &IncidentBrief) -> Vec<Self> {
        events
            .iter()
            .filter_map(|event| {
                let completes = match event {
                    WorkflowEvent::InvestigationStarted { region, .. } => Some(*region),
                    _ => None,
                };
                let request = for_event(event, brief);
                (request.is_some() || completes.is_some()).then_some(Self { request, completes })
            })
            .collect()
    }

    pub(super) fn security_briefing(brief: &IncidentBrief) -> Self {
        Self {
            request: Some(security_briefing(brief)),
            completes: None,
        }
    }

    pub(super) fn chat(brief: &IncidentBrief, text: &str) -> Self {
        Self {
            request: Some(chat(brief, text)),
            completes: None,
        }
    }
}

/// Complete investigations whose narration job died with a previous
/// process, posting the fallback findings in its place. Returns how many.
pub(super) fn finish_interrupted(session: &mut IncidentSession) -> usize {
    let pending: Vec<Region> = Region::ALL
        .into_iter()
        .filter(|r| session.region(*r).state() == WorkflowState::Investigating)
        .collect();
    let brief = IncidentBrief::from(&*session);
    for region in &pending {
        let event = WorkflowEvent::InvestigationStarted {
            region: *region,
            required_patch: session.region(*region).required_patch().to_string(),
        };
        if let Err(e) = session.complete_investigation(*region) {
            debug!(%region, error = %e, "investigation no longer pending");
            continue;
        }
        if let Some(request) = for_event(&event, &brief) {
            session.push_message(ChatMessage::assistant(request.persona, request.fallback));
        }
    }
    pending.len()
}

pub(super) async fn run_jobs(
    inner: Arc<Inner>,
    session_id: Uuid,
    brief: IncidentBrief,
    mut history: Vec<ChatMessage>,
    jobs: Vec<NarrationJob>,
) {
    for job in jobs {
        let message = match &job.request {
            Some(request) => Some(
                inner
                    .narrator
                    .narrate(request, &brief, &history)
                    .await
                    .into_message(),
            ),
            None => None,
        };
        if let Some(message) = &message {
            history.push(message.clone());
        }
        if !apply(&inner, session_id, message, job.completes).await {
            return;
        }
    }
}

/// Apply one narration result. Returns `false` if the session was replaced.
async fn apply(
    inner: &Inner,
    session_id: Uuid,
    message: Option<ChatMessage>,
    completes: Option<Region>,
) -> bool {
    let commit = {
        let mut guard = inner.state.lock().await;
        if guard.session.id() != session_id {
            debug!(%session_id, "session replaced; dropping narration");
            return false;
        }
        let mut events = Vec::new();
        if let Some(region) = completes {
            match guard.session.complete_investigation(region) {
                Ok(event) => events.push(event),
                Err(e) => debug!(%region, error = %e, "investigation no longer pending"),
            }
        }
        let messages: Vec<ChatMessage> = message.into_iter().collect();
        for m in &messages {
            guard.session.push_message(m.clone());
        }
        inner.commit(&guard.session, events, messages)
    };

    for message in commit.messages {
        inner.bus.publish(SimEvent::from(message));
    }
    inner.bus.publish(SimEvent::state(commit.view));
    true
}

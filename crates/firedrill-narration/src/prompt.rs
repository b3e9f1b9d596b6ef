//! Workflow event to narration request mapping.
//!
//! Each request carries a prompt for the model and a fallback written to
//! state the same facts: what happened and which command to run next.

use firedrill_core::catalog::CVE;
use firedrill_core::event::format_duration;
use firedrill_core::{Persona, WorkflowEvent};

use crate::brief::IncidentBrief;

/// Something a persona should say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationRequest {
    /// Who speaks.
    pub persona: Persona,
    /// Instruction sent as the final user turn.
    pub prompt: String,
    /// Text used when generation fails.
    pub fallback: String,
}

impl NarrationRequest {
    fn new(persona: Persona, prompt: String, fallback: String) -> Self {
        Self {
            persona,
            prompt,
            fallback,
        }
    }
}

/// Narration for a workflow event, or `None` for events that only change
/// state silently.
#[must_use]
pub fn for_event(event: &WorkflowEvent, brief: &IncidentBrief) -> Option<NarrationRequest> {
    let request = match event {
        WorkflowEvent::InvestigationStarted {
            region,
            required_patch,
        } => NarrationRequest::new(
            Persona::Sre,
            format!(
                "The operator paged the SRE team about {region}. In 2-3 sentences, report the \
                 investigation findings: kernel logs in {region} show the {} exploit path and the \
                 region must be patched to kernel {required_patch}. Tell them to run \
                 `patch {region} {required_patch}`.",
                CVE.id
            ),
            format!(
                "Investigation of {region} complete. Kernel logs show the {} exploit path in \
                 network packet processing. {region} needs kernel {required_patch}: run \
                 `patch {region} {required_patch}` to start the rollout.",
                CVE.id
            ),
        ),
        WorkflowEvent::PatchFailed {
            region,
            progress,
            failure_count,
        } => NarrationRequest::new(
            Persona::Sre,
            format!(
                "The kernel rollout in {region} just failed at {progress}% (failure number \
                 {failure_count}). Error rates spiked. Explain briefly and tell the operator to run \
                 `rollback {region}` before patching again."
            ),
            format!(
                "Rollout in {region} failed at {progress}% and error rates are spiking. Run \
                 `rollback {region}` to restore the previous kernel, then patch again."
            ),
        ),
        WorkflowEvent::PatchSucceeded { region, version } => {
            let remaining = brief
                .regions
                .iter()
                .filter(|r| !r.state.is_patched_or_later())
                .count();
            let next = if remaining == 0 {
                "Every region is patched; the security auditor takes it from here.".to_string()
            } else {
                format!("{remaining} region(s) still need the fix.")
            };
            NarrationRequest::new(
                Persona::Sre,
                format!(
                    "Kernel {version} finished rolling out across all {} servers in {region} and \
                     error rates are dropping. Acknowledge it in 1-2 sentences. {next}",
                    region.servers()
                ),
                format!(
                    "Kernel {version} is live on all {} servers in {region}. {next}",
                    region.servers()
                ),
            )
        },
        WorkflowEvent::RollbackCompleted { region } => {
            let command = brief
                .region(*region)
                .and_then(|r| r.known_patch.as_deref())
                .map_or_else(
                    || format!("`patch {region} <version>`"),
                    |patch| format!("`patch {region} {patch}`"),
                );
            NarrationRequest::new(
                Persona::Sre,
                format!(
                    "The rollback in {region} completed and the previous kernel is restored. In \
                     1-2 sentences, tell the operator it is safe to retry with {command}."
                ),
                format!(
                    "Rollback in {region} complete; the previous kernel is back. Retry with \
                     {command}."
                ),
            )
        },
        WorkflowEvent::SecurityPhaseStarted { regions } => {
            let first = regions
                .first()
                .map_or_else(|| "<region>".to_string(), ToString::to_string);
            NarrationRequest::new(
                Persona::Security,
                format!(
                    "Every region is patched. Introduce yourself as the security auditor for {} \
                     and explain that each region now has a three-item checklist. Tell the \
                     operator to start with `verify {first}`.",
                    CVE.id
                ),
                format!(
                    "Security auditor here. Every region is patched, so the {} audit begins: each \
                     region has a three-item checklist. Start with `verify {first}`.",
                    CVE.id
                ),
            )
        },
        WorkflowEvent::ItemVerified {
            region,
            description,
            finding,
            remaining,
        } => {
            let next = if *remaining == 0 {
                format!("{region} is fully verified.")
            } else {
                format!("{remaining} item(s) left in {region}; run `verify {region}` again.")
            };
            NarrationRequest::new(
                Persona::Security,
                format!(
                    "You just verified a checklist item in {region}: \"{description}\". The \
                     finding was: \"{finding}\". Report it in 1-2 sentences. {next}"
                ),
                format!("Verified in {region}: {description}. Finding: {finding}. {next}"),
            )
        },
        WorkflowEvent::AllVerified => NarrationRequest::new(
            Persona::Sre,
            "The security auditor has signed off on every region. Take back the incident as the \
             SRE and tell the operator to run `resolve` to request closure."
                .to_string(),
            "Security signed off on every region. Run `resolve` to request closure.".to_string(),
        ),
        WorkflowEvent::SreConfirmationRequested => NarrationRequest::new(
            Persona::Sre,
            "The operator asked to close the incident. Confirm that every region is patched and \
             verified, and tell them to run `resolve` once more to close it."
                .to_string(),
            "Every region is patched and verified, and I confirm we're ready to close. Run \
             `resolve` again to close the incident."
                .to_string(),
        ),
        WorkflowEvent::IncidentResolved { resolution_secs } => {
            let took = format_duration(*resolution_secs);
            NarrationRequest::new(
                Persona::Sre,
                format!(
                    "The incident is closed after {took}. Thank the operator in 2 sentences and \
                     mention one thing worth covering in the postmortem."
                ),
                format!(
                    "Incident closed after {took}. Nice work. Capture the failed rollouts and \
                     the audit findings in the postmortem."
                ),
            )
        },
        WorkflowEvent::InvestigationCompleted { .. }
        | WorkflowEvent::PatchStarted { .. }
        | WorkflowEvent::WrongPatchCompleted { .. }
        | WorkflowEvent::RollbackStarted { .. }
        | WorkflowEvent::RegionVerified { .. } => return None,
    };
    Some(request)
}

/// Security Auditor briefing for `alert security`.
#[must_use]
pub fn security_briefing(brief: &IncidentBrief) -> NarrationRequest {
    let outstanding: Vec<String> = brief
        .outstanding()
        .map(|r| format!("{}: {}", r.region, r.outstanding_items.join("; ")))
        .collect();
    if outstanding.is_empty() {
        return NarrationRequest::new(
            Persona::Security,
            "The operator paged security, but every checklist item is verified. Say so and \
             hand back to the SRE for `resolve`."
                .to_string(),
            "Every checklist item is verified. Nothing left on my side; run `resolve`.".to_string(),
        );
    }
    let list = outstanding.join("\n");
    NarrationRequest::new(
        Persona::Security,
        format!(
            "The operator paged security. Brief them on the outstanding checklist items and \
             which `verify <region>` to run first:\n{list}"
        ),
        format!("Outstanding checklist items:\n{list}\nWork through them with `verify <region>`."),
    )
}

/// Chat reply request for a free-form operator message.
#[must_use]
pub fn chat(brief: &IncidentBrief, text: &str) -> NarrationRequest {
    NarrationRequest::new(brief.persona, text.to_string(), chat_fallback(brief))
}

/// Reply used when chat generation fails.
#[must_use]
pub fn chat_fallback(brief: &IncidentBrief) -> String {
    format!(
        "The assistant is unavailable right now, but the drill keeps running.\n\nCurrent Phase: \
         {}\nHint: use the `hint` command for guidance, or check `status` to see what actions are \
         needed.",
        brief.phase
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedrill_core::Region;
    use firedrill_test::{drive_to_security_review, fresh_session, investigated};

    fn brief() -> IncidentBrief {
        IncidentBrief::from(&fresh_session())
    }

    #[test]
    fn investigation_reveals_required_patch() {
        let event = WorkflowEvent::InvestigationStarted {
            region: Region::UsEast,
            required_patch: "6.1.0-17".into(),
        };
        let request = for_event(&event, &brief()).unwrap();
        assert_eq!(request.persona, Persona::Sre);
        assert!(request.prompt.contains("6.1.0-17"));
        assert!(request.fallback.contains("patch us-east 6.1.0-17"));
    }

    #[test]
    fn failure_points_to_rollback() {
        let event = WorkflowEvent::PatchFailed {
            region: Region::Apac,
            progress: 44,
            failure_count: 1,
        };
        let request = for_event(&event, &brief()).unwrap();
        assert!(request.fallback.contains("44%"));
        assert!(request.fallback.contains("rollback apac"));
    }

    #[test]
    fn rollback_names_known_patch() {
        let mut session = fresh_session();
        investigated(&mut session, Region::EuCentral);
        let patch = session.region(Region::EuCentral).required_patch().to_string();
        let event = WorkflowEvent::RollbackCompleted {
            region: Region::EuCentral,
        };

        let request = for_event(&event, &IncidentBrief::from(&session)).unwrap();
        assert!(request.fallback.contains(&format!("patch eu-central {patch}")));

        let request = for_event(&event, &brief()).unwrap();
        assert!(request.fallback.contains("patch eu-central <version>"));
    }

    #[test]
    fn security_events_use_auditor() {
        let started = WorkflowEvent::SecurityPhaseStarted {
            regions: vec![Region::UsWest, Region::Apac],
        };
        let request = for_event(&started, &brief()).unwrap();
        assert_eq!(request.persona, Persona::Security);
        assert!(request.fallback.contains("verify us-west"));

        let item = WorkflowEvent::ItemVerified {
            region: Region::UsWest,
            description: "Audit logs".into(),
            finding: "Clean".into(),
            remaining: 2,
        };
        let request = for_event(&item, &brief()).unwrap();
        assert_eq!(request.persona, Persona::Security);
        assert!(request.fallback.contains("2 item(s) left"));
    }

    #[test]
    fn closure_events_use_sre() {
        for event in [
            WorkflowEvent::AllVerified,
            WorkflowEvent::SreConfirmationRequested,
        ] {
            let request = for_event(&event, &brief()).unwrap();
            assert_eq!(request.persona, Persona::Sre);
            assert!(request.fallback.contains("resolve"));
        }
        let resolved = WorkflowEvent::IncidentResolved {
            resolution_secs: 754,
        };
        let request = for_event(&resolved, &brief()).unwrap();
        assert!(request.fallback.contains("12m 34s"));
    }

    #[test]
    fn silent_events() {
        let silent = [
            WorkflowEvent::InvestigationCompleted {
                region: Region::UsEast,
            },
            WorkflowEvent::PatchStarted {
                region: Region::UsEast,
                version: "6.5.0-9".into(),
            },
            WorkflowEvent::WrongPatchCompleted {
                region: Region::UsEast,
                version: "6.5.0-9".into(),
            },
            WorkflowEvent::RollbackStarted {
                region: Region::UsEast,
            },
            WorkflowEvent::RegionVerified {
                region: Region::UsEast,
            },
        ];
        for event in silent {
            assert!(for_event(&event, &brief()).is_none(), "{event:?}");
        }
    }

    #[test]
    fn briefing_lists_outstanding_items() {
        let mut session = fresh_session();
        drive_to_security_review(&mut session);
        let request = security_briefing(&IncidentBrief::from(&session));
        assert_eq!(request.persona, Persona::Security);
        assert!(request.fallback.contains("us-east: Confirm kernel"));
        assert_eq!(request.fallback.lines().count(), 7);
    }

    #[test]
    fn chat_fallback_names_phase() {
        let request = chat(&brief(), "what now?");
        assert_eq!(request.prompt, "what now?");
        assert!(request.fallback.contains("Current Phase: triage"));
        assert!(request.fallback.contains("`hint`"));
    }
}

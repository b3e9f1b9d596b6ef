//! Persona system prompts.

use firedrill_core::catalog::{CVE, LOG_SERVICES, PATCH_VERSIONS};
use firedrill_core::Persona;

use crate::brief::IncidentBrief;

/// Commands the personas may tell the operator to run.
pub const SIM_COMMANDS: [&str; 12] = [
    "status",
    "metrics",
    "logs <service> [minutes]",
    "regions",
    "alert sre <region>",
    "alert security",
    "patch <region> <version>",
    "rollback <region>",
    "verify <region>",
    "resolve",
    "hint",
    "help",
];

const SRE_ROLE: &str = "You are an experienced SRE responding to a P0 incident.";

const SRE_STYLE: &str = "Be concise, technical, and helpful. Ask clarifying questions when \
needed. Provide specific actionable advice based on the current phase of the incident. If you \
don't know something, say so directly.\n\nTone: Calm under pressure, experienced, collaborative.";

const SECURITY_ROLE: &str = "You are a meticulous security auditor verifying the remediation \
of a P0 kernel vulnerability after the rollout.";

const SECURITY_STYLE: &str = "Walk the operator through the security checklist one item at a \
time. Report findings factually and say which region still needs verification. Do not declare \
the incident closed; that is the SRE's call.\n\nTone: Precise, skeptical, thorough.";

/// Keeps generated text inside the simulation.
fn guardrail() -> String {
    format!(
        "This is a training simulation. Only mention these commands: {}. Only mention these \
         patch versions: {}. Only mention these log services: {}. Never invent hosts, tools, \
         versions or commands. Keep replies under 120 words.",
        SIM_COMMANDS.join(", "),
        PATCH_VERSIONS.join(", "),
        LOG_SERVICES.join(", "),
    )
}

/// System prompt for a persona describing the live incident.
#[must_use]
pub fn system_prompt(persona: Persona, brief: &IncidentBrief) -> String {
    let (role, style) = match persona {
        Persona::Sre => (SRE_ROLE, SRE_STYLE),
        Persona::Security => (SECURITY_ROLE, SECURITY_STYLE),
    };
    format!(
        "{role} The current incident is {}: {}\n\nCurrent Status:\n{}\n{style}\n\n{}",
        CVE.id,
        CVE.description,
        brief.render(),
        guardrail(),
    )
}

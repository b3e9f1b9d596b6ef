//! Read-only command output.
//!
//! Every function here renders text from a session without mutating it.

use std::fmt::Write;

use chrono::TimeDelta;
use firedrill_core::catalog::{self, CVE, INITIAL_AFFECTED_SERVERS, LOG_SERVICES, SEVERITY};
use firedrill_core::{IncidentSession, Region, RegionHealth, RegionWorkflow};

const RULE: &str = "------------------------------------------------";

/// `status`: the incident at a glance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn status(session: &IncidentSession) -> String {
    let states: Vec<_> = session.regions().iter().map(RegionWorkflow::state).collect();
    let patched = states.iter().filter(|s| s.is_patched_or_later()).count();
    let in_progress = states.iter().filter(|s| s.is_in_flight()).count();
    let metrics = session.metrics();

    let title = format!("INCIDENT STATUS - {}", CVE.id);
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}\n", "=".repeat(title.len()));
    let _ = writeln!(out, "Phase:            {}", session.phase().as_str().to_uppercase());
    let _ = writeln!(out, "Severity:         {SEVERITY}");
    let _ = writeln!(
        out,
        "Simulated Time:   {}",
        session.sim_time().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "Affected Servers: {}",
        INITIAL_AFFECTED_SERVERS.saturating_sub(session.patched_servers())
    );
    let _ = writeln!(out, "Patched:          {patched}/{} regions", Region::ALL.len());
    let _ = writeln!(out, "In Progress:      {in_progress} regions");
    let _ = writeln!(out, "Error Rate:       {:.2}%", metrics.error_rate);
    let _ = writeln!(out, "P99 Latency:      {:.0}ms", metrics.latency_p99);
    let _ = write!(
        out,
        "Traffic:          {:.1}M req/s",
        metrics.traffic_volume as f64 / 1_000_000.0
    );
    if let Some(secs) = session.resolution_secs() {
        let _ = write!(
            out,
            "\n\nResolved in {}",
            firedrill_core::event::format_duration(secs)
        );
    }
    out
}

/// `metrics [service]`: global metrics with trends and a regional breakdown.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn metrics(session: &IncidentSession, service: &str) -> String {
    let m = session.metrics();
    let mut out = String::new();
    let _ = writeln!(out, "METRICS: {}", service.to_uppercase());
    let _ = writeln!(out, "{RULE}\n");

    if service == "overview" || service == "all" {
        let _ = writeln!(out, "Global Metrics:");
        let _ = writeln!(out, "  Error Rate:     {:.2}% {}", m.error_rate, m.error_trend());
        let _ = writeln!(out, "  P99 Latency:    {:.0}ms {}", m.latency_p99, m.latency_trend());
        let _ = writeln!(
            out,
            "  Traffic:        {:.1}M req/s",
            m.traffic_volume as f64 / 1_000_000.0
        );
        let _ = writeln!(
            out,
            "  Health Score:   {}%\n",
            m.health_score(session.remediated_count())
        );
    }

    let _ = writeln!(out, "Regional Breakdown:");
    for w in session.regions().iter() {
        let icon = if w.state().is_patched_or_later() {
            '✓'
        } else if w.state().is_in_flight() {
            '⟳'
        } else {
            '○'
        };
        let _ = writeln!(
            out,
            "  {icon} {:<12} {:>3} servers  {:>5.2}% errors  {}",
            w.region().name(),
            w.region().servers(),
            w.error_rate(),
            health_label(RegionHealth::of(w)),
        );
    }
    out.trim_end().to_string()
}

/// `logs <service> [minutes]`, newest first. `None` for an unknown service.
#[must_use]
pub fn logs(session: &IncidentSession, service: &str, minutes: u32) -> Option<String> {
    if !LOG_SERVICES.contains(&service) {
        return None;
    }
    let entries = catalog::logs_for(service, minutes);

    let mut out = String::new();
    let _ = writeln!(out, "LOGS: {} (last {minutes}m)", service.to_uppercase());
    let _ = writeln!(out, "{RULE}\n");
    if entries.is_empty() {
        let _ = write!(out, "No logs found for {service} in the last {minutes} minutes.");
        return Some(out);
    }

    for (entry, region) in entries.iter().zip(Region::ALL.iter().cycle()) {
        let at = session
            .sim_time()
            .checked_sub_signed(TimeDelta::minutes(i64::from(entry.minutes_ago)))
            .unwrap_or(session.sim_time());
        let _ = writeln!(out, "[{}] {}", entry.level, at.format("%H:%M:%S"));
        let _ = writeln!(out, "   {} / {region}", entry.service);
        let _ = writeln!(out, "   {}\n", entry.render(region.name()));
    }
    Some(out.trim_end().to_string())
}

/// `regions`: workflow state, progress and health per region.
#[must_use]
pub fn regions(session: &IncidentSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "REGIONAL STATUS");
    let _ = writeln!(out, "{RULE}\n");
    for w in session.regions().iter() {
        let _ = writeln!(out, "{}", w.region().name().to_uppercase());
        let _ = writeln!(out, "  Servers:  {}", w.region().servers());
        let _ = writeln!(
            out,
            "  Status:   {}",
            w.state().as_str().replace('_', " ").to_uppercase()
        );
        if w.state().is_in_flight() || w.patch_progress() > 0 {
            let _ = writeln!(out, "  Progress: {}%", w.patch_progress());
        }
        if let Some(version) = w.patch_version() {
            let _ = writeln!(out, "  Kernel:   {version}");
        }
        let _ = writeln!(out, "  Health:   {}\n", health_label(RegionHealth::of(w)));
    }
    out.trim_end().to_string()
}

/// `help`: the command reference.
#[must_use]
pub fn help() -> String {
    format!(
        "AVAILABLE COMMANDS
{RULE}

STATUS & MONITORING
  status                      Show current incident status
  metrics [service]           View metrics (overview, edge, kernel, security)
  logs <service> [minutes]    View logs ({services})
  regions                     Show per-region rollout state and health

INCIDENT RESPONSE
  alert sre <region>          Page the SRE team to investigate a region
  patch <region> <version>    Roll out a kernel version ({versions})
  rollback <region>           Restore the previous kernel
  alert security              Ask the security auditor for a briefing
  verify <region>             Verify the next security checklist item
  resolve                     Request closure (run twice to close)

COMMUNICATION
  alert <leadership|customers|all> <message>
  query <question>            Ask the on-call persona a question

OTHER
  hint                        Get a hint for the current phase
  reset                       Start a fresh incident
  help                        Show this help

Regions: {regions}",
        services = LOG_SERVICES.join(", "),
        versions = catalog::PATCH_VERSIONS.join(", "),
        regions = Region::names(),
    )
}

fn health_label(health: RegionHealth) -> &'static str {
    match health {
        RegionHealth::Healthy => "HEALTHY",
        RegionHealth::Degraded => "DEGRADED",
        RegionHealth::Critical => "CRITICAL",
    }
}

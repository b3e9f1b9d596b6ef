//! Static scenario data for the kernel CVE drill.
//!
//! Regions, the vulnerability under response, the patch versions an operator
//! may roll out, security checklist templates, hints and canned log lines.
//! Nothing in here has behavior beyond lookup and template rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::phase::IncidentPhase;
use crate::random::RandomSource;
use crate::workflow::SecurityItem;

/// Number of simulated regions.
pub const REGION_COUNT: usize = 5;

/// Total servers across every region.
pub const TOTAL_SERVERS: u32 = 1042;

/// One of the fixed simulated deployment zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// `us-east`
    UsEast,
    /// `us-west`
    UsWest,
    /// `eu-west`
    EuWest,
    /// `eu-central`
    EuCentral,
    /// `apac`
    Apac,
}

impl Region {
    /// Every region in catalog order.
    pub const ALL: [Self; REGION_COUNT] = [
        Self::UsEast,
        Self::UsWest,
        Self::EuWest,
        Self::EuCentral,
        Self::Apac,
    ];

    /// Identifier used in commands and on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UsEast => "us-east",
            Self::UsWest => "us-west",
            Self::EuWest => "eu-west",
            Self::EuCentral => "eu-central",
            Self::Apac => "apac",
        }
    }

    /// Number of servers deployed in the region.
    #[must_use]
    pub const fn servers(self) -> u32 {
        match self {
            Self::UsEast => 234,
            Self::UsWest => 198,
            Self::EuWest => 187,
            Self::EuCentral => 156,
            Self::Apac => 267,
        }
    }

    /// Position of the region in [`Region::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Comma-separated list of every region name.
    #[must_use]
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|r| r.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WorkflowError::UnknownRegion(wanted.to_string()))
    }
}

/// The vulnerability driving the drill.
#[derive(Debug, Clone, Copy)]
pub struct Vulnerability {
    /// CVE identifier.
    pub id: &'static str,
    /// Human-readable summary.
    pub description: &'static str,
    /// Kernel builds known to be exposed.
    pub affected_kernels: &'static [&'static str],
}

/// The single scenario vulnerability.
pub const CVE: Vulnerability = Vulnerability {
    id: "CVE-2024-8765",
    description: "Linux kernel privilege escalation vulnerability in network packet processing. \
                  CVSS 9.8. Affects kernels 5.15.x through 6.6.x.",
    affected_kernels: &["5.15.0-105", "5.15.0-106", "6.1.0-15", "6.1.0-16", "6.5.0-8"],
};

/// Kernel builds an operator can roll out. Each region requires one of them.
pub const PATCH_VERSIONS: [&str; 4] = ["6.5.0-9", "6.5.0-10", "6.1.0-17", "6.6.0-2"];

/// Incident severity for the scenario.
pub const SEVERITY: &str = "P0";

/// Servers flagged as exposed when the incident opens.
pub const INITIAL_AFFECTED_SERVERS: u32 = 847;

/// Request rate across the fleet (requests per second).
pub const INITIAL_TRAFFIC_VOLUME: u64 = 1_250_000;

/// Resolve an operator-supplied version against the catalog.
///
/// # Errors
///
/// Returns [`WorkflowError::UnknownVersion`] if the version is not offered.
pub fn patch_version(version: &str) -> Result<&'static str, WorkflowError> {
    let wanted = version.trim();
    PATCH_VERSIONS
        .into_iter()
        .find(|v| *v == wanted)
        .ok_or_else(|| WorkflowError::UnknownVersion(wanted.to_string()))
}

/// Draw a required patch uniformly from [`PATCH_VERSIONS`].
pub(crate) fn random_patch(rng: &mut dyn RandomSource) -> &'static str {
    let index = rng.pick_index(PATCH_VERSIONS.len());
    PATCH_VERSIONS[index.min(PATCH_VERSIONS.len().saturating_sub(1))]
}

/// A security checklist entry before region substitution.
///
/// `{region}`, `{patch}` and `{servers}` are replaced when rendered.
#[derive(Debug, Clone, Copy)]
pub struct ChecklistTemplate {
    /// What the auditor must check.
    pub description: &'static str,
    /// Canned findings; one is drawn per region.
    pub findings: &'static [&'static str],
}

/// Checklist applied to every region when the security phase opens.
pub const CHECKLIST: [ChecklistTemplate; 3] = [
    ChecklistTemplate {
        description: "Confirm kernel {patch} is running on all {servers} servers in {region}",
        findings: &[
            "uname -r reports {patch} on {servers}/{servers} hosts",
            "Fleet inventory shows {patch} everywhere; 2 hosts needed a reboot to pick it up",
        ],
    },
    ChecklistTemplate {
        description: "Audit auth and kernel audit logs in {region} for CVE-2024-8765 exploitation",
        findings: &[
            "No successful privilege escalation; 3 blocked attempts from a known scanner range",
            "No exploit signatures matched in the last 72 hours",
        ],
    },
    ChecklistTemplate {
        description: "Check {region} for unauthorized setuid binaries and unsigned kernel modules",
        findings: &[
            "Module and setuid inventory matches the golden image",
            "One stale debug module found and removed; no malicious artifacts",
        ],
    },
];

fn render(template: &str, region: Region, patch: &str) -> String {
    template
        .replace("{region}", region.name())
        .replace("{patch}", patch)
        .replace("{servers}", &region.servers().to_string())
}

/// Build the checklist for one region, drawing a finding per item.
pub(crate) fn checklist_for(
    region: Region,
    patch: &str,
    rng: &mut dyn RandomSource,
) -> Vec<SecurityItem> {
    CHECKLIST
        .iter()
        .map(|template| {
            let index = rng
                .pick_index(template.findings.len())
                .min(template.findings.len().saturating_sub(1));
            let finding = template.findings.get(index).copied().unwrap_or_default();
            SecurityItem::new(
                render(template.description, region, patch),
                render(finding, region, patch),
            )
        })
        .collect()
}

const TRIAGE_HINTS: &[&str] = &[
    "Start by checking the current status of all regions to understand the scope.",
    "Look at the error rates and latency metrics to assess impact.",
    "Check if exploitation has been detected by querying the security logs.",
];

const INVESTIGATION_HINTS: &[&str] = &[
    "Review kernel logs for panic traces and error patterns.",
    "Check the patch compatibility with current kernel versions.",
    "Look at edge proxy logs to understand customer impact.",
];

const RESPONSE_HINTS: &[&str] = &[
    "Start patching regions one at a time, beginning with the least critical.",
    "Monitor error rates after each patch to catch any issues early.",
    "If a patch fails, consider rolling back and investigating before retrying.",
];

const GENERAL_HINTS: &[&str] = &[
    "Use the 'status' command to see your current progress.",
    "The 'hint' command will always provide contextual guidance.",
    "You can ask questions using the 'query' command.",
];

/// Hints for a phase. A resolved incident falls back to general hints.
#[must_use]
pub fn hints(phase: IncidentPhase) -> &'static [&'static str] {
    match phase {
        IncidentPhase::Triage => TRIAGE_HINTS,
        IncidentPhase::Investigation => INVESTIGATION_HINTS,
        IncidentPhase::Response => RESPONSE_HINTS,
        IncidentPhase::Resolved => GENERAL_HINTS,
    }
}

/// Log severity used by canned log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        })
    }
}

/// A canned log line. `{region}` is substituted when rendered.
#[derive(Debug, Clone, Copy)]
pub struct LogTemplate {
    /// Emitting service.
    pub service: &'static str,
    /// Severity.
    pub level: LogLevel,
    /// Simulated age of the entry in minutes.
    pub minutes_ago: u32,
    /// Message text.
    pub message: &'static str,
}

const KERNEL_LOGS: &[LogTemplate] = &[
    LogTemplate {
        service: "kernel",
        level: LogLevel::Error,
        minutes_ago: 15,
        message: "Kernel panic in {region}: general protection fault at ip:ffff9f8b4c2d8a22",
    },
    LogTemplate {
        service: "kernel",
        level: LogLevel::Warn,
        minutes_ago: 18,
        message: "Unexpected system call pattern detected on 3 nodes in {region}",
    },
];

const EDGE_LOGS: &[LogTemplate] = &[
    LogTemplate {
        service: "edge-proxy",
        level: LogLevel::Warn,
        minutes_ago: 5,
        message: "Elevated 5xx error rate in {region}: 2.4% (threshold: 1.0%)",
    },
    LogTemplate {
        service: "edge-proxy",
        level: LogLevel::Info,
        minutes_ago: 8,
        message: "Connection pool saturation detected in {region}",
    },
];

const SECURITY_LOGS: &[LogTemplate] = &[LogTemplate {
    service: "security-monitor",
    level: LogLevel::Warn,
    minutes_ago: 25,
    message: "Suspicious network activity pattern matched CVE-2024-8765 signature in {region}",
}];

/// Services accepted by the `logs` command.
pub const LOG_SERVICES: [&str; 5] = ["kernel", "system", "edge", "security", "all"];

/// Canned log lines for a service, newest first, limited to `window_minutes`.
#[must_use]
pub fn logs_for(service: &str, window_minutes: u32) -> Vec<LogTemplate> {
    let service = service.trim().to_ascii_lowercase();
    let mut logs: Vec<LogTemplate> = Vec::new();
    if service == "kernel" || service == "system" {
        logs.extend_from_slice(KERNEL_LOGS);
    }
    if service == "edge" || service == "all" {
        logs.extend_from_slice(EDGE_LOGS);
    }
    if service == "security" || service == "all" {
        logs.extend_from_slice(SECURITY_LOGS);
    }
    logs.retain(|l| l.minutes_ago <= window_minutes);
    logs.sort_by_key(|l| l.minutes_ago);
    logs
}

impl LogTemplate {
    /// Render the message for a region.
    #[must_use]
    pub fn render(&self, region: &str) -> String {
        self.message.replace("{region}", region)
    }
}

/// Team an operator can page with `alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTeam {
    /// Site reliability on-call; paging it investigates a region.
    Sre,
    /// Security auditor; only reachable once the security phase opens.
    Security,
    /// Engineering leadership.
    Leadership,
    /// Customer communications.
    Customers,
    /// Every channel.
    All,
}

impl AlertTeam {
    /// Every team, in help order.
    pub const ALL: [Self; 5] = [
        Self::Sre,
        Self::Security,
        Self::Leadership,
        Self::Customers,
        Self::All,
    ];

    /// Identifier used in commands.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sre => "sre",
            Self::Security => "security",
            Self::Leadership => "leadership",
            Self::Customers => "customers",
            Self::All => "all",
        }
    }

    /// Number of channels a page is delivered to.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::All => 5,
            _ => 1,
        }
    }

    /// Parse a team name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for AlertTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedRandom;

    #[test]
    fn server_counts_add_up() {
        let total: u32 = Region::ALL.iter().map(|r| r.servers()).sum();
        assert_eq!(total, TOTAL_SERVERS);
    }

    #[test]
    fn region_parse_is_case_insensitive() {
        assert_eq!("US-EAST".parse::<Region>().unwrap(), Region::UsEast);
        assert_eq!(" apac ".parse::<Region>().unwrap(), Region::Apac);
    }

    #[test]
    fn unknown_region_is_reported() {
        let err = "mars-north".parse::<Region>().unwrap_err();
        assert_eq!(err, WorkflowError::UnknownRegion("mars-north".into()));
        assert!(err.to_string().contains("eu-central"));
    }

    #[test]
    fn region_index_matches_catalog_order() {
        for (i, region) in Region::ALL.iter().enumerate() {
            assert_eq!(region.index(), i);
        }
    }

    #[test]
    fn patch_version_lookup() {
        assert_eq!(patch_version("6.5.0-9").unwrap(), "6.5.0-9");
        assert!(matches!(
            patch_version("6.5.0-8"),
            Err(WorkflowError::UnknownVersion(_))
        ));
    }

    #[test]
    fn checklist_substitutes_region_and_patch() {
        let mut rng = FixedRandom::new(0, 0.5);
        let items = checklist_for(Region::EuWest, "6.1.0-17", &mut rng);
        assert_eq!(items.len(), CHECKLIST.len());
        assert!(items[0].description.contains("6.1.0-17"));
        assert!(items[0].description.contains("187"));
        assert!(items[1].description.contains("eu-west"));
        assert!(items.iter().all(|i| !i.verified));
        assert!(items.iter().all(|i| !i.finding.contains('{')));
    }

    #[test]
    fn logs_are_newest_first_and_windowed() {
        let all = logs_for("all", 60);
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].minutes_ago <= w[1].minutes_ago));

        let recent = logs_for("all", 6);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].service, "edge-proxy");

        assert!(logs_for("database", 60).is_empty());
        assert_eq!(logs_for("kernel", 60).len(), 2);
    }

    #[test]
    fn alert_team_parse() {
        assert_eq!(AlertTeam::parse("SRE"), Some(AlertTeam::Sre));
        assert_eq!(AlertTeam::parse("all").map(AlertTeam::channels), Some(5));
        assert_eq!(AlertTeam::parse("marketing"), None);
    }

    #[test]
    fn resolved_phase_uses_general_hints() {
        assert_eq!(hints(IncidentPhase::Resolved), GENERAL_HINTS);
        assert_eq!(hints(IncidentPhase::Triage).len(), 3);
    }
}

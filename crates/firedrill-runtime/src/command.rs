//! Operator command parsing.

use firedrill_core::catalog::AlertTeam;
use firedrill_core::{ActionKind, Region, WorkflowError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default window for `logs`, in minutes.
pub const DEFAULT_LOG_WINDOW_MINUTES: u32 = 30;

/// Outcome of one operator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command was accepted.
    pub success: bool,
    /// Text shown to the operator.
    pub output: String,
}

impl CommandResult {
    /// Accepted command.
    #[must_use]
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    /// Rejected command.
    #[must_use]
    pub fn rejected(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `status`
    Status,
    /// `metrics [service]`
    Metrics {
        /// Requested view; `overview` when omitted.
        service: String,
    },
    /// `logs <service> [minutes]`
    Logs {
        /// Service name.
        service: String,
        /// Look-back window.
        minutes: u32,
    },
    /// `regions`
    Regions,
    /// `hint`
    Hint,
    /// `help`
    Help,
    /// `query <question>`
    Query {
        /// Free-form question for the narrating persona.
        question: String,
    },
    /// `reset`
    Reset,
    /// `alert sre <region>`: investigate a region.
    AlertSre {
        /// Region to investigate.
        region: Region,
    },
    /// `alert security`: ask the auditor for a briefing.
    AlertSecurity,
    /// `alert leadership|customers|all <message>`
    Broadcast {
        /// Paged team.
        team: AlertTeam,
        /// Message text.
        message: String,
    },
    /// `patch <region> <version>`
    Patch {
        /// Target region.
        region: Region,
        /// Kernel version.
        version: String,
    },
    /// `rollback <region>`
    Rollback {
        /// Target region.
        region: Region,
    },
    /// `verify <region>`
    Verify {
        /// Target region.
        region: Region,
    },
    /// `resolve`
    Resolve,
}

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Not a known command.
    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    Unknown(String),

    /// Known command, wrong arguments.
    #[error("Usage: {0}")]
    Usage(String),

    /// `alert` to a team that does not exist.
    #[error("Invalid team '{0}'. Valid teams: sre, security, leadership, customers, all")]
    UnknownTeam(String),

    /// Unknown region or version.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl Command {
    /// Parse a command name and its arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing what the operator should type
    /// instead.
    pub fn parse(command: &str, args: &[String]) -> Result<Self, CommandError> {
        let arg = move |i: usize| args.get(i).map(|s| s.trim()).filter(|s| !s.is_empty());

        match command.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "metrics" => Ok(Self::Metrics {
                service: arg(0).unwrap_or("overview").to_ascii_lowercase(),
            }),
            "logs" => {
                let service = arg(0).unwrap_or("all").to_ascii_lowercase();
                let minutes = match arg(1) {
                    None => DEFAULT_LOG_WINDOW_MINUTES,
                    Some(raw) => parse_minutes(raw).ok_or_else(|| {
                        CommandError::Usage("logs <service> [minutes], e.g. 'logs kernel 30'".into())
                    })?,
                };
                Ok(Self::Logs { service, minutes })
            },
            "regions" => Ok(Self::Regions),
            "hint" => Ok(Self::Hint),
            "help" => Ok(Self::Help),
            "query" => {
                let question = args.join(" ").trim().to_string();
                if question.is_empty() {
                    return Err(CommandError::Usage("query <question>".into()));
                }
                Ok(Self::Query { question })
            },
            "reset" => Ok(Self::Reset),
            "alert" => parse_alert(args),
            "patch" => match (arg(0), arg(1)) {
                (Some(region), Some(version)) => Ok(Self::Patch {
                    region: region.parse()?,
                    version: version.to_string(),
                }),
                _ => Err(CommandError::Usage(format!(
                    "patch <region> <version> (regions: {})",
                    Region::names()
                ))),
            },
            "rollback" => Ok(Self::Rollback {
                region: region_arg(arg(0), "rollback <region>")?,
            }),
            "verify" => Ok(Self::Verify {
                region: region_arg(arg(0), "verify <region>")?,
            }),
            "resolve" => Ok(Self::Resolve),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Audit category of the command.
    #[must_use]
    pub fn action_kind(&self) -> ActionKind {
        match self {
            Self::Hint => ActionKind::Hint,
            _ => ActionKind::Command,
        }
    }
}

fn region_arg(raw: Option<&str>, usage: &str) -> Result<Region, CommandError> {
    match raw {
        Some(r) => Ok(r.parse()?),
        None => Err(CommandError::Usage(format!(
            "{usage} (regions: {})",
            Region::names()
        ))),
    }
}

fn parse_alert(args: &[String]) -> Result<Command, CommandError> {
    let Some(team_name) = args.first() else {
        return Err(CommandError::Usage(
            "alert <sre|security|leadership|customers|all> [target]".into(),
        ));
    };
    let team = AlertTeam::parse(team_name)
        .ok_or_else(|| CommandError::UnknownTeam(team_name.clone()))?;
    let rest = args.get(1..).unwrap_or_default();

    match team {
        AlertTeam::Sre => Ok(Command::AlertSre {
            region: region_arg(
                rest.first().map(|s| s.trim()).filter(|s| !s.is_empty()),
                "alert sre <region>",
            )?,
        }),
        AlertTeam::Security => Ok(Command::AlertSecurity),
        AlertTeam::Leadership | AlertTeam::Customers | AlertTeam::All => Ok(Command::Broadcast {
            team,
            message: rest.join(" ").trim().to_string(),
        }),
    }
}

/// Minutes from `30`, `30m` or `30min`.
fn parse_minutes(raw: &str) -> Option<u32> {
    let digits = raw
        .trim()
        .trim_end_matches("min")
        .trim_end_matches('m');
    digits.parse::<u32>().ok().filter(|m| *m > 0)
}

/// Split a typed line into a command and its arguments.
#[must_use]
pub fn split_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?.to_string();
    Some((command, parts.map(str::to_string).collect()))
}

/// The command line as it goes into the audit trail.
#[must_use]
pub fn audit_line(command: &str, args: &[String]) -> String {
    format!("{} {}", command.trim(), args.join(" ")).trim().to_string()
}

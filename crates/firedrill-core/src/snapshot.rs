//! Schema-versioned session snapshots.
//!
//! A snapshot is `{ "schema_version": N, "session": { ... } }`. Version 1
//! predates the security phase and failure tracking; it is migrated once on
//! load by filling in those fields. Unknown versions are rejected.

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;

use crate::session::IncidentSession;

/// Snapshot schema written by this build.
pub const SCHEMA_VERSION: u64 = 2;

const LEGACY_SCHEMA_VERSION: u64 = 1;

/// Errors decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not valid JSON, or the session does not match the schema.
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by an incompatible build.
    #[error("unsupported snapshot schema version {found} (supported: 1, 2)")]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u64,
    },

    /// Missing envelope fields.
    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

/// Result alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Serialize)]
struct Envelope<'a> {
    schema_version: u64,
    session: &'a IncidentSession,
}

/// Serialize a session under the current schema version.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn encode(session: &IncidentSession) -> SnapshotResult<String> {
    Ok(serde_json::to_string_pretty(&Envelope {
        schema_version: SCHEMA_VERSION,
        session,
    })?)
}

/// Parse a snapshot, migrating legacy versions.
///
/// # Errors
///
/// Fails on malformed JSON, unknown schema versions, or a session that
/// violates the workflow invariants (wrong region set, out-of-range progress).
pub fn decode(text: &str) -> SnapshotResult<IncidentSession> {
    let mut root: Value = serde_json::from_str(text)?;
    let version = root
        .get("schema_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| SnapshotError::Malformed("missing schema_version".to_string()))?;
    let mut session = root
        .get_mut("session")
        .map(Value::take)
        .ok_or_else(|| SnapshotError::Malformed("missing session".to_string()))?;

    match version {
        SCHEMA_VERSION => {},
        LEGACY_SCHEMA_VERSION => {
            migrate_v1(&mut session)?;
            info!(from = version, to = SCHEMA_VERSION, "migrated session snapshot");
        },
        found => return Err(SnapshotError::UnsupportedVersion { found }),
    }
    Ok(serde_json::from_value(session)?)
}

fn migrate_v1(session: &mut Value) -> SnapshotResult<()> {
    let obj = session
        .as_object_mut()
        .ok_or_else(|| SnapshotError::Malformed("session is not an object".to_string()))?;

    // v1 has no checklists; review-range regions go back to `patched` and the
    // security phase starts again on the next tick.
    if let Some(Value::Array(regions)) = obj.get_mut("regions") {
        for region in regions.iter_mut().filter_map(Value::as_object_mut) {
            let state = region.get("state").and_then(Value::as_str).unwrap_or("idle");
            if matches!(state, "security_review" | "verified") {
                region.insert("state".to_string(), json!("patched"));
            }
            default(region, "failure_count", json!(0));
            default(region, "security_items", json!([]));
            default(region, "security_verified", json!(false));
        }
    }

    default(obj, "ai_persona", json!("sre"));
    default(obj, "security_phase_active", json!(false));
    default(obj, "sre_confirmed", json!(false));
    default(obj, "closure_requested", json!(false));
    default(obj, "resolved", json!(false));
    default(obj, "resolution_secs", Value::Null);
    default(obj, "hints_used", json!(0));
    default(obj, "messages", json!([]));
    default(obj, "actions", json!([]));
    Ok(())
}

fn default(obj: &mut Map<String, Value>, key: &str, value: Value) {
    obj.entry(key).or_insert(value);
}

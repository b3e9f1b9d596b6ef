//! Shared harness for the drill tests.

use std::sync::Arc;

use firedrill_core::{Region, WorkflowState};
use firedrill_narration::{Narrator, NarratorConfig};
use firedrill_runtime::{CommandResult, IncidentRuntime, RuntimeConfig, split_line};
use firedrill_test::{MockLlmProvider, calm_random};
use tempfile::TempDir;

/// Ticks allowed for a rollout or rollback to finish.
pub const MAX_TICKS: u32 = 64;

/// A runtime persisting into its own temp directory.
#[allow(dead_code)]
pub struct DrillHarness {
    /// The runtime under test.
    pub runtime: IncidentRuntime,
    /// The mock narration backend, when one was supplied.
    pub provider: Option<Arc<MockLlmProvider>>,
    /// Snapshot directory (held to prevent cleanup).
    pub state_dir: TempDir,
}

#[allow(dead_code)]
impl DrillHarness {
    /// Harness with fallback-only narration.
    pub fn new() -> Self {
        let state_dir = TempDir::new().expect("failed to create tempdir");
        let runtime = runtime_in(&state_dir, Narrator::disabled());
        Self {
            runtime,
            provider: None,
            state_dir,
        }
    }

    /// Harness whose narration comes from a mock model.
    pub fn with_provider(provider: MockLlmProvider) -> Self {
        let provider = Arc::new(provider);
        let state_dir = TempDir::new().expect("failed to create tempdir");
        let narrator = Narrator::new(Arc::clone(&provider) as _, NarratorConfig::default());
        let runtime = runtime_in(&state_dir, narrator);
        Self {
            runtime,
            provider: Some(provider),
            state_dir,
        }
    }

    /// A second runtime over the same snapshot directory.
    pub fn restart(&self) -> IncidentRuntime {
        runtime_in(&self.state_dir, Narrator::disabled())
    }

    /// Run a typed command line.
    pub async fn run(&self, line: &str) -> CommandResult {
        let (command, args) = split_line(line).expect("empty command line");
        self.runtime.execute(&command, &args).await
    }

    /// Workflow state of one region.
    pub async fn state_of(&self, region: Region) -> WorkflowState {
        self.runtime.with_session(|s| s.region(region).state()).await
    }

    /// Tick until the region leaves its transitional state.
    pub async fn settle(&self, region: Region) -> WorkflowState {
        settle(&self.runtime, region).await
    }
}

/// Tick `runtime` until `region` is neither patching nor rolling back.
pub async fn settle(runtime: &IncidentRuntime, region: Region) -> WorkflowState {
    for _ in 0..MAX_TICKS {
        runtime.tick().await;
        let state = runtime.with_session(|s| s.region(region).state()).await;
        if !matches!(state, WorkflowState::Patching | WorkflowState::RollingBack) {
            return state;
        }
    }
    panic!("{region} did not settle");
}

#[allow(dead_code)]
fn runtime_in(dir: &TempDir, narrator: Narrator) -> IncidentRuntime {
    let config = RuntimeConfig {
        state_dir: Some(dir.path().to_path_buf()),
        ..RuntimeConfig::default()
    };
    IncidentRuntime::with_random(config, narrator, Box::new(calm_random()))
}

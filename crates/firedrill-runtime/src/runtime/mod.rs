//! The session façade.
//!
//! [`IncidentRuntime`] owns the one live incident. Commands, chat and clock
//! ticks each take the session lock for exactly one transition, persist and
//! broadcast the result, and only then schedule narration. Narration never
//! runs under the lock.

mod clock;
mod dispatch;
mod narration;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use firedrill_core::catalog::CVE;
use firedrill_core::{
    ActionKind, ActionRecord, ChatMessage, IncidentSession, RandomSource, SeededRandom,
    SessionView, WorkflowEvent,
};
use firedrill_events::{EventBus, EventReceiver, SimEvent};
use firedrill_narration::{IncidentBrief, Narrator};
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::{Command, CommandError, CommandResult, audit_line};
use crate::config_bridge::RuntimeConfig;
use crate::store::SessionStore;

use self::clock::AbortOnDrop;
use self::dispatch::{FollowUp, Outcome};
use self::narration::NarrationJob;

/// The live session plus the random source its transitions draw from.
struct SessionState {
    session: IncidentSession,
    rng: Box<dyn RandomSource>,
}

/// Everything observers and narration need from one committed transition.
struct Commit {
    session_id: Uuid,
    view: SessionView,
    brief: IncidentBrief,
    history: Vec<ChatMessage>,
    events: Vec<WorkflowEvent>,
    messages: Vec<ChatMessage>,
}

struct Inner {
    state: Mutex<SessionState>,
    narrator: Narrator,
    bus: EventBus,
    store: Option<SessionStore>,
    tasks: TaskTracker,
    config: RuntimeConfig,
    observers: AtomicUsize,
    ticker: Mutex<Option<AbortOnDrop>>,
}

impl Inner {
    /// Persist the session and capture what gets broadcast.
    fn commit(
        &self,
        session: &IncidentSession,
        events: Vec<WorkflowEvent>,
        messages: Vec<ChatMessage>,
    ) -> Commit {
        if let Some(store) = &self.store
            && let Err(e) = store.save(session)
        {
            warn!(error = %e, "failed to persist session");
        }
        Commit {
            session_id: session.id(),
            view: SessionView::from(session),
            brief: IncidentBrief::from(session),
            history: session
                .recent_messages(self.narrator.config().history_messages)
                .to_vec(),
            events,
            messages,
        }
    }
}

/// Owns the incident and serializes every transition on it.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct IncidentRuntime {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for IncidentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentRuntime")
            .field("narrator", &self.inner.narrator)
            .field("config", &self.inner.config)
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}

impl IncidentRuntime {
    /// Create a runtime, resuming the saved incident if one exists.
    #[must_use]
    pub fn new(config: RuntimeConfig, narrator: Narrator) -> Self {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        };
        Self::with_random(config, narrator, rng)
    }

    /// Create a runtime with an explicit random source.
    #[must_use]
    pub fn with_random(
        config: RuntimeConfig,
        narrator: Narrator,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let store = config.state_dir.as_ref().map(SessionStore::new);
        let session = match store.as_ref().and_then(SessionStore::load_or_discard) {
            Some(mut session) => {
                info!(session_id = %session.id(), phase = %session.phase(), "resumed saved incident");
                let finished = narration::finish_interrupted(&mut session);
                if finished > 0 {
                    info!(count = finished, "completed investigations interrupted by restart");
                    if let Some(store) = &store
                        && let Err(e) = store.save(&session)
                    {
                        warn!(error = %e, "failed to persist session");
                    }
                }
                session
            },
            None => {
                let session = IncidentSession::new(rng.as_mut(), Utc::now());
                info!(session_id = %session.id(), "started new incident");
                session
            },
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState { session, rng }),
                narrator,
                bus: EventBus::new(),
                store,
                tasks: TaskTracker::new(),
                config,
                observers: AtomicUsize::new(0),
                ticker: Mutex::new(None),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Operator surface
    // ---------------------------------------------------------------------

    /// Run one operator command. Rejections come back as
    /// `success: false`; every command lands in the audit trail.
    pub async fn execute(&self, command: &str, args: &[String]) -> CommandResult {
        let line = audit_line(command, args);
        let parsed = Command::parse(command, args);
        let kind = parsed
            .as_ref()
            .map_or(ActionKind::Command, Command::action_kind);
        self.run(parsed, kind, line).await
    }

    /// Send free-form chat to the narrating persona. The reply arrives as a
    /// `message` event.
    pub async fn send_message(&self, content: &str) {
        let question = content.trim();
        if question.is_empty() {
            return;
        }
        let command = Command::Query {
            question: question.to_string(),
        };
        self.run(Ok(command), ActionKind::Chat, question.to_string())
            .await;
    }

    /// Discard the incident and start a fresh one.
    pub async fn reset(&self) {
        self.run(Ok(Command::Reset), ActionKind::Command, "reset".into())
            .await;
    }

    /// Current client view of the session.
    pub async fn state(&self) -> SessionView {
        SessionView::from(&self.inner.state.lock().await.session)
    }

    /// Run `f` against the session under the lock.
    pub async fn with_session<T>(&self, f: impl FnOnce(&IncidentSession) -> T) -> T {
        f(&self.inner.state.lock().await.session)
    }

    /// Subscribe to broadcast events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.bus.subscribe()
    }

    /// Banner a new observer is greeted with.
    #[must_use]
    pub fn welcome_banner(&self) -> String {
        format!(
            "Connected to the incident simulator. {}: {} Type 'help' for commands.",
            CVE.id, CVE.description
        )
    }

    async fn run(
        &self,
        parsed: Result<Command, CommandError>,
        kind: ActionKind,
        line: String,
    ) -> CommandResult {
        let (outcome, commit) = {
            let mut guard = self.inner.state.lock().await;
            let history_len = self.inner.narrator.config().history_messages;
            let mut outcome = match parsed {
                Ok(command) => guard.dispatch(&command, history_len),
                Err(e) => Outcome::rejected(e.to_string()),
            };
            if !outcome.reset {
                guard.session.record_action(ActionRecord::new(
                    kind,
                    line.as_str(),
                    outcome.result.success,
                ));
            }
            let commit = self.inner.commit(
                &guard.session,
                std::mem::take(&mut outcome.events),
                std::mem::take(&mut outcome.messages),
            );
            (outcome, commit)
        };

        debug!(command = %line, success = outcome.result.success, "command handled");

        if outcome.reset {
            info!(session_id = %commit.session_id, "incident reset");
            self.inner
                .bus
                .publish(SimEvent::system(dispatch::reset_banner()));
            if self.observer_count() > 0 {
                self.stop_clock().await;
                self.start_clock().await;
            }
        }

        self.publish(commit, outcome.follow_up);
        outcome.result
    }

    // ---------------------------------------------------------------------
    // Simulation clock
    // ---------------------------------------------------------------------

    /// Advance the simulation by one tick and broadcast the result.
    pub async fn tick(&self) -> Vec<WorkflowEvent> {
        let commit = {
            let mut guard = self.inner.state.lock().await;
            let SessionState { session, rng } = &mut *guard;
            let events = session.tick(
                rng.as_mut(),
                self.inner.config.clock.sim_step(),
                Utc::now(),
            );
            self.inner.commit(session, events, Vec::new())
        };
        let events = commit.events.clone();
        self.publish(commit, None);
        events
    }

    /// Start the periodic tick if it is not running.
    pub async fn start_clock(&self) {
        let mut ticker = self.inner.ticker.lock().await;
        if ticker.is_none() {
            let interval = self.inner.config.clock.interval;
            *ticker = Some(clock::spawn_ticker(Arc::downgrade(&self.inner), interval));
            info!(interval_ms = interval.as_millis(), "simulation clock started");
        }
    }

    /// Stop the periodic tick.
    pub async fn stop_clock(&self) {
        if self.inner.ticker.lock().await.take().is_some() {
            info!("simulation clock stopped");
        }
    }

    /// Whether the periodic tick is running.
    pub async fn clock_running(&self) -> bool {
        self.inner.ticker.lock().await.is_some()
    }

    /// Note a new observer. The first one starts the clock.
    pub async fn observer_attached(&self) {
        let now = self
            .inner
            .observers
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        debug!(observers = now, "observer attached");
        self.start_clock().await;
    }

    /// Note a departed observer. The last one stops the clock unless the
    /// runtime is configured to keep running while idle.
    pub async fn observer_detached(&self) {
        let previous = self
            .inner
            .observers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        let now = previous.saturating_sub(1);
        debug!(observers = now, "observer detached");
        if now == 0 && self.inner.config.stop_when_idle {
            self.stop_clock().await;
        }
    }

    /// Observers currently attached.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.load(Ordering::SeqCst)
    }

    // ---------------------------------------------------------------------
    // Narration and shutdown
    // ---------------------------------------------------------------------

    /// Wait until every scheduled narration has finished.
    pub async fn wait_for_narration(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    /// Stop the clock, drain narration and write a final snapshot.
    pub async fn shutdown(&self) {
        self.stop_clock().await;
        self.wait_for_narration().await;
        if let Some(store) = &self.inner.store {
            let guard = self.inner.state.lock().await;
            if let Err(e) = store.save(&guard.session) {
                warn!(error = %e, "failed to persist session on shutdown");
            }
        }
        info!("incident runtime stopped");
    }

    /// Broadcast a commit and schedule its narration.
    fn publish(&self, commit: Commit, follow_up: Option<FollowUp>) {
        let Commit {
            session_id,
            view,
            brief,
            history,
            events,
            messages,
        } = commit;

        for message in messages {
            self.inner.bus.publish(SimEvent::from(message));
        }
        self.inner.bus.publish(SimEvent::state(view));
        for (severity, text) in events.iter().filter_map(WorkflowEvent::notification) {
            self.inner.bus.publish(SimEvent::notification(severity, text));
        }

        let mut jobs = NarrationJob::for_events(&events, &brief);
        let mut history = history;
        match follow_up {
            Some(FollowUp::SecurityBriefing) => jobs.push(NarrationJob::security_briefing(&brief)),
            Some(FollowUp::Chat {
                text,
                history: before,
            }) => {
                history = before;
                jobs.push(NarrationJob::chat(&brief, &text));
            },
            None => {},
        }
        if jobs.is_empty() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        self.inner.tasks.spawn(narration::run_jobs(
            inner, session_id, brief, history, jobs,
        ));
    }
}

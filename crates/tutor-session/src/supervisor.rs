//! The Supervisor & Registry: the only shared mutable structure in the
//! system. Grounded on the teacher's `SessionRegistry` (a `DashMap` keyed by
//! learner id, atomic insert-if-absent via `entry()`), extended with a
//! reaper that removes a learner's entry once its actor task exits — by
//! normal completion or by panic. `tokio::spawn` already isolates a panicking
//! task from the rest of the process; the reaper's job is just to make sure
//! the Registry doesn't keep pointing at a dead actor.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::error;

use tutor_core::types::{SessionKey, Topic};
use tutor_core::SessionCoreConfig;

use tutor_tools::{ToolClient, ToolExecutor};

use crate::actor::{SessionActor, TransportSink};
use crate::persistence::PersistenceStore;
use crate::session::SessionHandle;

/// Arguments for starting a new session. `topic` seeds the first lesson; a
/// resumed session (persistence finds a prior snapshot) keeps its own topic
/// unless this one overrides it. `transport_sink` is how a caller (a
/// gateway) wires up server-pushed events for this learner; it can only be
/// supplied at spawn time, since the actor owns it for its whole lifetime.
#[derive(Clone, Default)]
pub struct InitArgs {
    pub topic: Option<Topic>,
    pub transport_sink: Option<TransportSink>,
}

impl std::fmt::Debug for InitArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitArgs")
            .field("topic", &self.topic)
            .field("transport_sink", &self.transport_sink.is_some())
            .finish()
    }
}

/// Outcome of `start_session`: either a freshly spawned actor, or the handle
/// to one that was already running for this learner (spec §4.4 uniqueness
/// guarantee — starting twice never produces two actors).
pub enum StartOutcome {
    Started(SessionHandle),
    AlreadyRunning(SessionHandle),
}

impl StartOutcome {
    pub fn handle(&self) -> &SessionHandle {
        match self {
            StartOutcome::Started(h) | StartOutcome::AlreadyRunning(h) => h,
        }
    }
}

pub struct Supervisor {
    sessions: Arc<DashMap<SessionKey, SessionHandle>>,
    executor: Arc<ToolExecutor>,
    tool_client: Arc<ToolClient>,
    config: Arc<SessionCoreConfig>,
    persistence: Arc<dyn PersistenceStore>,
}

impl Supervisor {
    pub fn new(
        executor: Arc<ToolExecutor>,
        tool_client: Arc<ToolClient>,
        config: Arc<SessionCoreConfig>,
        persistence: Arc<dyn PersistenceStore>,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            executor,
            tool_client,
            config,
            persistence,
        }
    }

    /// Starts a session for `learner_id`, or returns the handle to the one
    /// already running. Never spawns a second actor for the same key.
    pub async fn start_session(&self, learner_id: SessionKey, init_args: InitArgs) -> StartOutcome {
        if let Some(existing) = self.sessions.get(&learner_id) {
            return StartOutcome::AlreadyRunning(existing.clone());
        }

        let restored = if self.config.persistence_enabled {
            self.persistence
                .restore(learner_id.as_str())
                .await
                .unwrap_or_else(|err| {
                    error!(learner_id = %learner_id, %err, "failed to restore session snapshot, starting fresh");
                    None
                })
        } else {
            None
        };

        let (handle, join) = SessionActor::spawn(
            learner_id.clone(),
            init_args.topic,
            restored,
            self.executor.clone(),
            self.tool_client.clone(),
            self.config.clone(),
            self.persistence.clone(),
            init_args.transport_sink,
        );

        match self.sessions.entry(learner_id.clone()) {
            Entry::Occupied(occupied) => {
                // Another caller won the race between our `get` check and
                // this insert; the actor we just spawned is surplus.
                join.abort();
                StartOutcome::AlreadyRunning(occupied.get().clone())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(handle.clone());
                self.spawn_reaper(learner_id, join);
                StartOutcome::Started(handle)
            }
        }
    }

    pub fn lookup(&self, learner_id: &SessionKey) -> Option<SessionHandle> {
        self.sessions.get(learner_id).map(|entry| entry.clone())
    }

    /// Requests a graceful shutdown; the Registry entry is released by the
    /// reaper once the actor actually exits, not by this call.
    pub async fn stop_session(&self, learner_id: &SessionKey) -> bool {
        match self.sessions.get(learner_id) {
            Some(handle) => {
                let _ = handle.request_shutdown(true).await;
                true
            }
            None => false,
        }
    }

    pub fn active_ids(&self) -> Vec<SessionKey> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    fn spawn_reaper(&self, learner_id: SessionKey, join: tokio::task::JoinHandle<()>) {
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            if let Err(join_err) = join.await {
                if join_err.is_panic() {
                    error!(learner_id = %learner_id, "session actor panicked, removing from registry");
                }
            }
            sessions.remove(&learner_id);
        });
    }
}

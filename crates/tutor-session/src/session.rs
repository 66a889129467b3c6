//! The external Session API. A `SessionHandle` is a cheap-clone reference to
//! a running actor; it never touches Session state directly — every
//! operation is a message on the actor's inbox, including introspection.

use tokio::sync::{mpsc, oneshot};

use tutor_core::types::{PublicView, SessionKey};

/// Returned when a `SessionHandle` operation cannot be delivered because the
/// actor has already shut down. Not a tool-call failure, not an invalid
/// transition — just "nobody is listening on the other end anymore".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session is no longer accepting messages")]
pub struct Rejected;

/// Messages a `SessionHandle` can put on the actor's inbox. Tool completions
/// and the periodic tick are delivered over separate internal channels the
/// actor owns directly — they never pass through here, since nothing outside
/// the actor originates them.
#[derive(Debug)]
pub(crate) enum SessionEvent {
    UserMessage(String),
    GetSnapshot(oneshot::Sender<PublicView>),
    Shutdown { graceful: bool },
}

/// A cheap-clone reference to a running Session actor. Safe to hand to
/// multiple transport connections for the same learner; every clone writes
/// to the same inbox.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) learner_id: SessionKey,
    pub(crate) inbox: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn learner_id(&self) -> &SessionKey {
        &self.learner_id
    }

    /// Enqueues a learner message for dispatch. Returns as soon as the
    /// message is queued — it does not wait for the resulting state
    /// transition or any tool call it triggers.
    pub async fn handle_user_message(&self, content: impl Into<String>) -> Result<(), Rejected> {
        self.inbox
            .send(SessionEvent::UserMessage(content.into()))
            .await
            .map_err(|_| Rejected)
    }

    /// Reads the current state through the actor's own inbox, so the
    /// returned view never races a concurrent mutation.
    pub async fn get_snapshot(&self) -> Result<PublicView, Rejected> {
        let (tx, rx) = oneshot::channel();
        self.inbox
            .send(SessionEvent::GetSnapshot(tx))
            .await
            .map_err(|_| Rejected)?;
        rx.await.map_err(|_| Rejected)
    }

    /// Requests shutdown. `graceful` persists a final snapshot first (when
    /// persistence is enabled); a non-graceful shutdown drops state in place.
    pub async fn request_shutdown(&self, graceful: bool) -> Result<(), Rejected> {
        self.inbox
            .send(SessionEvent::Shutdown { graceful })
            .await
            .map_err(|_| Rejected)
    }
}

//! The persistence contract: one JSON snapshot per session id, overwritten
//! on every successful write. Grounded on the teacher's `ctx_file.rs` insofar
//! as both key storage by session id under a root directory — but the
//! teacher's format is an append-only conversation transcript built for
//! resuming an LLM chat; a Session here has no chat history to replay, only
//! a `PublicView` to restore, so a single overwritten file is sufficient and
//! far simpler.

use std::path::PathBuf;

use async_trait::async_trait;

use tutor_core::types::PublicView;
use tutor_core::Result;

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn persist(&self, session_id: &str, snapshot: &PublicView) -> Result<()>;
    async fn restore(&self, session_id: &str) -> Result<Option<PublicView>>;
}

/// Persistence is disabled, or this deployment has no durable storage wired
/// in. `restore` always reports nothing to resume.
pub struct NullPersistence;

#[async_trait]
impl PersistenceStore for NullPersistence {
    async fn persist(&self, _session_id: &str, _snapshot: &PublicView) -> Result<()> {
        Ok(())
    }

    async fn restore(&self, _session_id: &str) -> Result<Option<PublicView>> {
        Ok(None)
    }
}

/// One `<root>/<session_id>.json` file per learner, replaced wholesale on
/// every persist. `session_id` comes from `SessionKey::as_str`, which is
/// already the learner id chosen by the transport layer — no additional
/// sanitization is applied here beyond what a filesystem path requires.
pub struct FilePersistence {
    root: PathBuf,
}

impl FilePersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("{session_id}.json"))
    }
}

#[async_trait]
impl PersistenceStore for FilePersistence {
    async fn persist(&self, session_id: &str, snapshot: &PublicView) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path_for(session_id).with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, self.path_for(session_id)).await?;
        Ok(())
    }

    async fn restore(&self, session_id: &str) -> Result<Option<PublicView>> {
        match tokio::fs::read(self.path_for(session_id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::psm::State;
    use tutor_core::types::Metrics;

    fn sample() -> PublicView {
        PublicView {
            learner_id: "alice".into(),
            psm_state: State::Exposition,
            topic: None,
            question: None,
            history: Vec::new(),
            metrics: Metrics::new(),
            attempt_count: 0,
        }
    }

    #[tokio::test]
    async fn round_trips_a_snapshot_through_disk() {
        let dir = std::env::temp_dir().join(format!("tutor-session-persist-test-{}", std::process::id()));
        let store = FilePersistence::new(&dir);

        assert!(store.restore("alice").await.unwrap().is_none());
        store.persist("alice", &sample()).await.unwrap();
        let restored = store.restore("alice").await.unwrap().unwrap();
        assert_eq!(restored.learner_id, "alice");
        assert_eq!(restored.psm_state, State::Exposition);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn null_persistence_never_resumes_anything() {
        let store = NullPersistence;
        store.persist("anyone", &sample()).await.unwrap();
        assert!(store.restore("anyone").await.unwrap().is_none());
    }
}

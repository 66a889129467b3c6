//! Session — the per-learner actor that drives the pedagogical state
//! machine, and the Supervisor that owns the set of running sessions.

pub mod actor;
pub mod persistence;
pub mod session;
pub mod supervisor;

pub use actor::{SessionActor, TransportSink};
pub use persistence::{FilePersistence, NullPersistence, PersistenceStore};
pub use session::{Rejected, SessionHandle};
pub use supervisor::{InitArgs, StartOutcome, Supervisor};

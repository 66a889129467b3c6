//! Session Core — shared types, the pedagogical state machine, the
//! diagnosis/intervention classifier, configuration, and the wire protocol.

pub mod config;
pub mod diagnosis;
pub mod error;
pub mod protocol;
pub mod psm;
pub mod types;

pub use config::SessionCoreConfig;
pub use error::{Error, Result};
pub use protocol::*;
pub use types::*;

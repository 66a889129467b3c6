//! The Session Core's typed error enum: the §7 error kinds plus the ambient
//! conditions (I/O, config, auth, malformed wire JSON) that arise once the
//! core is embedded in a real transport/persistence binary.

use thiserror::Error;

use crate::psm::{Event, InvalidTransition, State};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid transition: {state:?} does not accept {event:?}")]
    InvalidTransition { state: State, event: Event },

    #[error("tool error: {tool} - {message}")]
    ToolError { tool: String, message: String },

    #[error("tool timeout: {tool} after {elapsed_ms}ms")]
    ToolTimeout { tool: String, elapsed_ms: u64 },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),

    #[error("authentication failed: {reason}")]
    AuthFailed { reason: String },

    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("llm error: {provider} - {message}")]
    LlmError { provider: String, message: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<InvalidTransition> for Error {
    fn from(value: InvalidTransition) -> Self {
        Self::InvalidTransition {
            state: value.state,
            event: value.event,
        }
    }
}

impl Error {
    pub fn invalid_transition(state: State, event: Event) -> Self {
        Self::InvalidTransition { state, event }
    }

    pub fn tool_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn tool_timeout(tool: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::ToolTimeout {
            tool: tool.into(),
            elapsed_ms,
        }
    }

    pub fn auth_failed(reason: impl Into<String>) -> Self {
        Self::AuthFailed {
            reason: reason.into(),
        }
    }

    pub fn llm_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LlmError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

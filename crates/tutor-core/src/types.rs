//! Core data types shared by every Session Core component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::psm::State;

/// A learner identifier — cheaply cloneable, keyed only as an opaque string
/// (never interned as a host-runtime symbol; identifiers come from
/// untrusted transport input).
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SessionKey(Arc<str>);

impl SessionKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A correlation token linking a tool submission to its eventual terminal
/// result. Opaque outside the crate; never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
}

/// One turn of the learner/tutor transcript. Append-only, strictly
/// time-ordered within a Session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub tier: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub correct_answer: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub difficulty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// What the Session intends to do with a tool's terminal result. Recorded
/// alongside the correlation token so `ToolResult` dispatch doesn't need to
/// re-derive context from the current (possibly since-changed) state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    GenerateQuestion,
    CheckAnswer,
    DiagnoseError,
    CreateRemediation,
    ProvideHint,
    ExplainConcept,
    ClassifyIntent,
}

impl IntentTag {
    pub fn tool_name(self) -> &'static str {
        match self {
            IntentTag::GenerateQuestion => "generate_question",
            IntentTag::CheckAnswer => "check_answer",
            IntentTag::DiagnoseError => "diagnose_error",
            IntentTag::CreateRemediation => "create_remediation",
            IntentTag::ProvideHint => "provide_hint",
            IntentTag::ExplainConcept => "explain_concept",
            IntentTag::ClassifyIntent => "classify_intent",
        }
    }
}

/// A tool call the Session is waiting on. `reply_context` carries whatever
/// is needed to produce the eventual reply without re-deriving it from
/// Session state that may have moved on by the time the result arrives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingCall {
    pub tool_name: String,
    pub started_at: DateTime<Utc>,
    pub deadline_ms: u64,
    pub intent_tag: IntentTag,
    #[serde(default)]
    pub reply_context: serde_json::Value,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub started_at: Option<DateTime<Utc>>,
    pub questions_attempted: u64,
    pub questions_correct: u64,
    pub topics_covered: HashSet<String>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            last_activity: Some(Utc::now()),
            ..Default::default()
        }
    }
}

/// Read-only view returned by `get_snapshot`. Never used to mutate state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicView {
    pub learner_id: String,
    pub psm_state: State,
    pub topic: Option<Topic>,
    pub question: Option<Question>,
    pub history: Vec<HistoryEntry>,
    pub metrics: Metrics,
    pub attempt_count: u32,
}

/// Gateway configuration (bind address, auth mode).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: BindMode,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_port() -> u16 {
    18080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: BindMode::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    Loopback,
    #[default]
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    pub token: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Token,
    None,
}

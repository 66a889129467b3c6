//! Wire types for LLM requests and streaming responses. The pedagogical
//! tools never need a recursive tool-use loop — each is a single prompt in,
//! single JSON/text response out — so these stay deliberately simpler than
//! a general agentic chat client's message types.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    pub fn single_user_turn(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![LlmMessage::user(prompt)],
            max_tokens: Some(1024),
            temperature: Some(0.3),
            system: Some(system.into()),
        }
    }
}

impl Default for LlmRequest {
    fn default() -> Self {
        Self {
            model: "claude-haiku-4-5-20251001".to_string(),
            messages: Vec::new(),
            max_tokens: Some(1024),
            temperature: None,
            system: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: LlmContent,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: LlmContent::Text(content.into()),
        }
    }
}

/// Message content — a plain string, or a provider-specific block array for
/// providers that need it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LlmContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<String> for LlmContent {
    fn from(s: String) -> Self {
        LlmContent::Text(s)
    }
}

impl From<&str> for LlmContent {
    fn from(s: &str) -> Self {
        LlmContent::Text(s.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Incremental piece of a streamed completion.
#[derive(Clone, Debug)]
pub enum StreamDelta {
    Text(String),
    Done {
        stop_reason: Option<String>,
        usage: Option<Usage>,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

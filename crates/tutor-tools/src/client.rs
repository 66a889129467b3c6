//! The Tool Client: a stateless abstraction over the fixed set of
//! pedagogical tool operations from spec §6. Every tool is a function
//! `(args) -> Result<value, reason>`; callers never invoke a tool directly —
//! they go through `ToolExecutor::submit`, which owns this client.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use tutor_llm::LlmProvider;

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("llm error: {0}")]
    Llm(String),
    #[error("malformed tool output: {0}")]
    Malformed(String),
}

/// One of the seven fixed pedagogical operations. Each implementation also
/// documents a deterministic fallback (spec §7) — fallbacks are part of the
/// user-visible contract, not an accident of implementation, so their
/// output must stay stable enough for tests to assert on.
#[async_trait]
pub trait PedagogicalTool: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, args: Value) -> Result<Value, ToolCallError>;

    fn fallback(&self, args: &Value) -> Value;
}

/// Registry of the fixed tool set, addressed by name.
pub struct ToolClient {
    tools: HashMap<&'static str, Arc<dyn PedagogicalTool>>,
}

impl ToolClient {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn PedagogicalTool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Builds the client with all seven pedagogical tools backed by a
    /// single shared LLM provider.
    pub fn with_default_tools(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        let model = model.into();
        let mut client = Self::new();
        client.register(Arc::new(crate::tools::generate_question::GenerateQuestionTool::new(
            provider.clone(),
            model.clone(),
        )));
        client.register(Arc::new(crate::tools::check_answer::CheckAnswerTool::new(
            provider.clone(),
            model.clone(),
        )));
        client.register(Arc::new(crate::tools::diagnose_error::DiagnoseErrorTool::new(
            provider.clone(),
            model.clone(),
        )));
        client.register(Arc::new(crate::tools::create_remediation::CreateRemediationTool::new(
            provider.clone(),
            model.clone(),
        )));
        client.register(Arc::new(crate::tools::explain_concept::ExplainConceptTool::new(
            provider.clone(),
            model.clone(),
        )));
        client.register(Arc::new(crate::tools::provide_hint::ProvideHintTool::new(
            provider.clone(),
            model.clone(),
        )));
        client.register(Arc::new(crate::tools::classify_intent::ClassifyIntentTool::new(
            provider,
            model,
        )));
        client
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolCallError> {
        match self.tools.get(name) {
            Some(tool) => tool.call(args).await,
            None => Err(ToolCallError::Malformed(format!("unknown tool: {}", name))),
        }
    }

    /// The deterministic fallback for a tool, used when the real call
    /// errors, times out, or is cancelled and the Session needs a
    /// degraded-but-non-fatal reply (spec §7).
    pub fn fallback(&self, name: &str, args: &Value) -> Value {
        match self.tools.get(name) {
            Some(tool) => tool.fallback(args),
            None => serde_json::json!({}),
        }
    }
}

impl Default for ToolClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the first JSON object found in an LLM completion, tolerating a
/// ```json fenced block or leading/trailing prose around the object.
pub(crate) fn extract_json_object(text: &str) -> Result<Value, ToolCallError> {
    let trimmed = text.trim();
    let candidate = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end_matches("```"))
        .unwrap_or(trimmed);

    let start = candidate.find('{');
    let end = candidate.rfind('}');
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if e >= s => (s, e),
        _ => return Err(ToolCallError::Malformed("no JSON object found in completion".into())),
    };

    serde_json::from_str(&candidate[start..=end])
        .map_err(|e| ToolCallError::Malformed(format!("invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_object_handles_fenced_block() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nthanks";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn extract_json_object_handles_bare_object() {
        let value = extract_json_object(r#"{"a": true}"#).unwrap();
        assert_eq!(value["a"], true);
    }

    #[test]
    fn extract_json_object_rejects_no_object() {
        assert!(extract_json_object("no json here").is_err());
    }
}

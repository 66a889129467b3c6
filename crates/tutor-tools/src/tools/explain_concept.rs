use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{PedagogicalTool, ToolCallError};

const SYSTEM: &str = "You are a patient tutor explaining a concept the student asked about. \
Reply with plain prose only, no JSON, 2-4 sentences, no jargon beyond what the question uses.";

pub struct ExplainConceptTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl ExplainConceptTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for ExplainConceptTool {
    fn name(&self) -> &'static str {
        "explain_concept"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let topic_name = args
            .pointer("/topic/name")
            .and_then(Value::as_str)
            .unwrap_or("this topic");
        let message = args.get("message").and_then(Value::as_str).unwrap_or("");

        let prompt = format!(
            "Topic: {}\nThe student asked: \"{}\"\nExplain the underlying concept.",
            topic_name, message
        );
        let request = LlmRequest::single_user_turn(self.model.clone(), SYSTEM, prompt);
        let completion = tutor_llm::complete(self.provider.as_ref(), request)
            .await
            .map_err(|e| ToolCallError::Llm(e.to_string()))?;
        Ok(Value::String(completion.trim().to_string()))
    }

    fn fallback(&self, args: &Value) -> Value {
        let topic_name = args
            .pointer("/topic/name")
            .and_then(Value::as_str)
            .unwrap_or("this topic");
        Value::String(format!(
            "{} builds on a few core ideas — try breaking the question into smaller steps and \
            working through them one at a time.",
            topic_name
        ))
    }
}

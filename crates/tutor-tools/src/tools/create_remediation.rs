use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{PedagogicalTool, ToolCallError};

const SYSTEM: &str = "You are a patient tutor writing a short remediation explanation for a \
known misconception. Reply with plain prose only, no JSON, 2-4 sentences.";

pub struct CreateRemediationTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl CreateRemediationTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for CreateRemediationTool {
    fn name(&self) -> &'static str {
        "create_remediation"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let topic_name = args
            .pointer("/topic/name")
            .and_then(Value::as_str)
            .unwrap_or("this topic");
        let category = args
            .pointer("/diagnosis/error_category")
            .and_then(Value::as_str)
            .unwrap_or("a computational error");
        let description = args
            .pointer("/diagnosis/error_description")
            .and_then(Value::as_str)
            .unwrap_or("");

        let prompt = format!(
            "Topic: {}\nThe student made {} ({}). Write a short remediation explanation.",
            topic_name, category, description
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
            "Let's look at {} again, one step at a time. Try re-reading the question carefully \
            before you answer.",
            topic_name
        ))
    }
}

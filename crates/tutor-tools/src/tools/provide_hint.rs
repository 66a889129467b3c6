use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{PedagogicalTool, ToolCallError};

const SYSTEM: &str = "You are giving a student a single Socratic hint toward a question they are \
stuck on, without revealing the answer. Reply with plain prose only, no JSON, 1-2 sentences.";

pub struct ProvideHintTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl ProvideHintTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for ProvideHintTool {
    fn name(&self) -> &'static str {
        "provide_hint"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let question_text = args
            .pointer("/question/text")
            .and_then(Value::as_str)
            .unwrap_or("");
        let context = args.get("context").and_then(Value::as_str).unwrap_or("");

        let prompt = format!(
            "Question: {}\nContext: {}\nGive one hint that nudges toward the answer without \
            revealing it.",
            question_text, context
        );
        let request = LlmRequest::single_user_turn(self.model.clone(), SYSTEM, prompt);
        let completion = tutor_llm::complete(self.provider.as_ref(), request)
            .await
            .map_err(|e| ToolCallError::Llm(e.to_string()))?;
        Ok(Value::String(completion.trim().to_string()))
    }

    fn fallback(&self, args: &Value) -> Value {
        let hint = args
            .pointer("/question/hint")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        Value::String(hint.unwrap_or_else(|| {
            "Try re-reading the question and writing down what you already know before you \
            answer."
                .to_string()
        }))
    }
}

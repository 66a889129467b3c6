use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{PedagogicalTool, ToolCallError};

const SYSTEM: &str = "Classify a student's message in a tutoring session into exactly one of: \
request_question, request_help, understanding_confirmation, confusion, answer_attempt, general. \
Reply with only that single word, no punctuation, no explanation.";

const VALID_INTENTS: &[&str] = &[
    "request_question",
    "request_help",
    "understanding_confirmation",
    "confusion",
    "answer_attempt",
    "general",
];

pub struct ClassifyIntentTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl ClassifyIntentTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for ClassifyIntentTool {
    fn name(&self) -> &'static str {
        "classify_intent"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let message = args.get("message").and_then(Value::as_str).unwrap_or("");
        let prompt = format!("Message: \"{}\"", message);
        let request = LlmRequest::single_user_turn(self.model.clone(), SYSTEM, prompt);
        let completion = tutor_llm::complete(self.provider.as_ref(), request)
            .await
            .map_err(|e| ToolCallError::Llm(e.to_string()))?;
        let intent = completion.trim().to_lowercase();
        if VALID_INTENTS.contains(&intent.as_str()) {
            Ok(Value::String(intent))
        } else {
            Err(ToolCallError::Malformed(format!(
                "model returned unrecognized intent: {}",
                intent
            )))
        }
    }

    /// Falls back to the least assumptive label rather than guessing —
    /// a Session dispatching on `general` always has a defined handler.
    fn fallback(&self, _args: &Value) -> Value {
        Value::String("general".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_is_general() {
        struct NoProvider;
        #[async_trait]
        impl LlmProvider for NoProvider {
            fn name(&self) -> &str {
                "none"
            }
            fn models(&self) -> &[&str] {
                &[]
            }
            async fn complete_stream(&self, _: LlmRequest) -> tutor_llm::LlmResult<tutor_llm::LlmStream> {
                unreachable!()
            }
        }
        let tool = ClassifyIntentTool::new(Arc::new(NoProvider), "test-model".into());
        assert_eq!(tool.fallback(&json!({})), "general");
    }
}

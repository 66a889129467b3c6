use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{extract_json_object, PedagogicalTool, ToolCallError};

const SYSTEM: &str = "You are a tutoring question generator. Reply with exactly one JSON object \
and no other text, shaped { \"text\": string, \"type\": string, \"correct_answer\": string, \
\"difficulty\": integer, \"hint\": string|null }.";

pub struct GenerateQuestionTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl GenerateQuestionTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for GenerateQuestionTool {
    fn name(&self) -> &'static str {
        "generate_question"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let topic_name = args
            .pointer("/topic/name")
            .and_then(Value::as_str)
            .unwrap_or("the current topic");
        let prompt = format!(
            "Generate one practice question for the topic \"{}\". \
            Reply with only the JSON object described in your instructions.",
            topic_name
        );
        let request = LlmRequest::single_user_turn(self.model.clone(), SYSTEM, prompt);
        let completion = tutor_llm::complete(self.provider.as_ref(), request)
            .await
            .map_err(|e| ToolCallError::Llm(e.to_string()))?;
        let mut value = extract_json_object(&completion)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("topic".to_string(), args.get("topic").cloned().unwrap_or(Value::Null));
        }
        Ok(value)
    }

    fn fallback(&self, args: &Value) -> Value {
        let topic_name = args
            .pointer("/topic/name")
            .and_then(Value::as_str)
            .unwrap_or("the current topic");
        json!({
            "text": format!("Solve this problem related to {}. What is 7 + 8?", topic_name),
            "topic": args.get("topic").cloned().unwrap_or(Value::Null),
            "type": "short_answer",
            "correct_answer": "15",
            "difficulty": 1,
            "hint": Value::Null,
        })
    }
}

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{extract_json_object, PedagogicalTool, ToolCallError};

const SYSTEM: &str = "You are diagnosing why a student's answer to a tutoring question was \
wrong. Reply with exactly one JSON object and no other text, shaped { \"error_identified\": \
boolean, \"error_category\": string, \"error_description\": string, \"misconception\": string, \
\"confidence\": number between 0 and 1, \"suggested_approach\": string }.";

pub struct DiagnoseErrorTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl DiagnoseErrorTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for DiagnoseErrorTool {
    fn name(&self) -> &'static str {
        "diagnose_error"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let question_text = args
            .pointer("/question/text")
            .and_then(Value::as_str)
            .unwrap_or("");
        let student_answer = args
            .pointer("/answer_data/student_answer")
            .and_then(Value::as_str)
            .unwrap_or("");
        let correct_answer = args
            .pointer("/answer_data/correct_answer")
            .and_then(Value::as_str)
            .unwrap_or("");

        let prompt = format!(
            "Question: {}\nCorrect answer: {}\nStudent's wrong answer: {}\n\
            Reply with only the JSON object described in your instructions.",
            question_text, correct_answer, student_answer
        );
        let request = LlmRequest::single_user_turn(self.model.clone(), SYSTEM, prompt);
        let completion = tutor_llm::complete(self.provider.as_ref(), request)
            .await
            .map_err(|e| ToolCallError::Llm(e.to_string()))?;
        extract_json_object(&completion)
    }

    /// Deterministic fallback: reports the error as unidentified at the
    /// default confidence — matches spec §8 invariant 11 exactly (missing
    /// confidence defaults to 0.5 and classification falls through to
    /// `Unknown`, which is always safe to hand to the remediation branch).
    fn fallback(&self, _args: &Value) -> Value {
        json!({
            "error_identified": false,
            "error_category": "unknown",
            "error_description": "Unable to determine the specific error automatically.",
            "misconception": "",
            "confidence": 0.5,
            "suggested_approach": "Walk through the problem step by step with the student.",
        })
    }
}

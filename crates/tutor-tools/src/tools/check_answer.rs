use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use tutor_llm::{LlmProvider, LlmRequest};

use crate::client::{extract_json_object, PedagogicalTool, ToolCallError};

const SYSTEM: &str = "You are grading a student's answer to a tutoring question. Reply with \
exactly one JSON object and no other text, shaped { \"is_correct\": boolean, \"feedback\": \
string, \"explanation\": string }.";

pub struct CheckAnswerTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl CheckAnswerTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }
}

#[async_trait]
impl PedagogicalTool for CheckAnswerTool {
    fn name(&self) -> &'static str {
        "check_answer"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let question_text = args
            .pointer("/question/text")
            .and_then(Value::as_str)
            .unwrap_or("");
        let correct_answer = args
            .pointer("/question/correct_answer")
            .and_then(Value::as_str)
            .unwrap_or("");
        let student_answer = args.get("student_answer").and_then(Value::as_str).unwrap_or("");

        let prompt = format!(
            "Question: {}\nExpected answer: {}\nStudent answer: {}\n\
            Reply with only the JSON object described in your instructions.",
            question_text, correct_answer, student_answer
        );
        let request = LlmRequest::single_user_turn(self.model.clone(), SYSTEM, prompt);
        let completion = tutor_llm::complete(self.provider.as_ref(), request)
            .await
            .map_err(|e| ToolCallError::Llm(e.to_string()))?;
        let mut value = extract_json_object(&completion)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("student_answer".to_string(), json!(student_answer));
            obj.insert("correct_answer".to_string(), json!(correct_answer));
        }
        Ok(value)
    }

    /// Deterministic fallback: case-insensitive, whitespace-trimmed string
    /// equality against the recorded correct answer (spec §7).
    fn fallback(&self, args: &Value) -> Value {
        let correct_answer = args
            .pointer("/question/correct_answer")
            .and_then(Value::as_str)
            .unwrap_or("");
        let student_answer = args.get("student_answer").and_then(Value::as_str).unwrap_or("");
        let is_correct = student_answer.trim().eq_ignore_ascii_case(correct_answer.trim());
        json!({
            "is_correct": is_correct,
            "feedback": if is_correct { "Correct!" } else { "That's not quite right." },
            "explanation": "",
            "student_answer": student_answer,
            "correct_answer": correct_answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> CheckAnswerTool {
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
        CheckAnswerTool::new(Arc::new(NoProvider), "test-model".into())
    }

    #[test]
    fn fallback_matches_on_trimmed_case_insensitive_equality() {
        let args = json!({
            "question": { "correct_answer": "15" },
            "student_answer": " 15 ",
        });
        assert_eq!(tool().fallback(&args)["is_correct"], true);

        let args = json!({
            "question": { "correct_answer": "15" },
            "student_answer": "16",
        });
        assert_eq!(tool().fallback(&args)["is_correct"], false);
    }
}

//! Integration tests driving whole learner interactions through the public
//! `Supervisor`/`SessionHandle` API, against a deterministic fake tool set
//! (no network, no real LLM).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tutor_core::psm::State;
use tutor_core::types::{SessionKey, Topic};
use tutor_core::SessionCoreConfig;
use tutor_session::{InitArgs, NullPersistence, StartOutcome, Supervisor};
use tutor_tools::{ExecutorConfig, PedagogicalTool, ToolCallError, ToolClient, ToolExecutor};

struct EchoQuestion;
#[async_trait]
impl PedagogicalTool for EchoQuestion {
    fn name(&self) -> &'static str {
        "generate_question"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(json!({
            "text": "What is 7 + 8?",
            "correct_answer": "15",
            "type": "short_answer",
            "difficulty": 1,
            "hint": "Count on from 8.",
        }))
    }
    fn fallback(&self, _args: &Value) -> Value {
        json!({
            "text": "What is 1 + 1?",
            "correct_answer": "2",
            "type": "short_answer",
            "difficulty": 1,
            "hint": null,
        })
    }
}

struct GradeByStringMatch;
#[async_trait]
impl PedagogicalTool for GradeByStringMatch {
    fn name(&self) -> &'static str {
        "check_answer"
    }
    async fn call(&self, args: Value) -> Result<Value, ToolCallError> {
        let expected = args.pointer("/question/correct_answer").and_then(Value::as_str).unwrap_or("");
        let given = args.get("student_answer").and_then(Value::as_str).unwrap_or("");
        let is_correct = given.trim() == expected.trim();
        Ok(json!({
            "is_correct": is_correct,
            "feedback": if is_correct { "Correct!" } else { "Not quite, let's see why." },
            "student_answer": given,
            "correct_answer": expected,
        }))
    }
    fn fallback(&self, _args: &Value) -> Value {
        json!({ "is_correct": false, "feedback": "fallback", "student_answer": "", "correct_answer": "" })
    }
}

struct AlwaysUnknownDiagnosis;
#[async_trait]
impl PedagogicalTool for AlwaysUnknownDiagnosis {
    fn name(&self) -> &'static str {
        "diagnose_error"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(json!({
            "error_identified": false,
            "error_category": "unknown",
            "error_description": "cause unclear",
            "misconception": "",
            "confidence": 0.3,
            "suggested_approach": "",
        }))
    }
    fn fallback(&self, _args: &Value) -> Value {
        json!({ "error_identified": false, "confidence": 0.5 })
    }
}

struct AlwaysKnownDiagnosis;
#[async_trait]
impl PedagogicalTool for AlwaysKnownDiagnosis {
    fn name(&self) -> &'static str {
        "diagnose_error"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(json!({
            "error_identified": true,
            "error_category": "carry_error",
            "error_description": "forgot to carry the 1",
            "misconception": "addition without carrying",
            "confidence": 0.9,
            "suggested_approach": "show the carry step explicitly",
        }))
    }
    fn fallback(&self, _args: &Value) -> Value {
        json!({ "error_identified": false, "confidence": 0.5 })
    }
}

struct CannedHint;
#[async_trait]
impl PedagogicalTool for CannedHint {
    fn name(&self) -> &'static str {
        "provide_hint"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(Value::String("Try counting on your fingers.".into()))
    }
    fn fallback(&self, _args: &Value) -> Value {
        Value::String("Re-read the question carefully.".into())
    }
}

struct CannedRemediation;
#[async_trait]
impl PedagogicalTool for CannedRemediation {
    fn name(&self) -> &'static str {
        "create_remediation"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(Value::String("Let's revisit carrying with a worked example.".into()))
    }
    fn fallback(&self, _args: &Value) -> Value {
        Value::String("Let's look at this again.".into())
    }
}

struct EchoExplain;
#[async_trait]
impl PedagogicalTool for EchoExplain {
    fn name(&self) -> &'static str {
        "explain_concept"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(Value::String("Addition combines two numbers into a total.".into()))
    }
    fn fallback(&self, _args: &Value) -> Value {
        Value::String("Let's break this down step by step.".into())
    }
}

struct FixedIntent(&'static str);
#[async_trait]
impl PedagogicalTool for FixedIntent {
    fn name(&self) -> &'static str {
        "classify_intent"
    }
    async fn call(&self, _args: Value) -> Result<Value, ToolCallError> {
        Ok(Value::String(self.0.to_string()))
    }
    fn fallback(&self, _args: &Value) -> Value {
        Value::String("general".into())
    }
}

fn build_supervisor(diagnosis: Arc<dyn PedagogicalTool>, intent: &'static str) -> Supervisor {
    let mut client = ToolClient::new();
    client.register(Arc::new(EchoQuestion));
    client.register(Arc::new(GradeByStringMatch));
    client.register(diagnosis);
    client.register(Arc::new(CannedHint));
    client.register(Arc::new(CannedRemediation));
    client.register(Arc::new(EchoExplain));
    client.register(Arc::new(FixedIntent(intent)));
    let client = Arc::new(client);
    let executor = Arc::new(ToolExecutor::new(client.clone(), ExecutorConfig::default()));
    let config = Arc::new(SessionCoreConfig { tick_ms: 60_000, ..SessionCoreConfig::default() });
    Supervisor::new(executor, client, config, Arc::new(NullPersistence))
}

fn addition_topic() -> Topic {
    Topic { id: "1".into(), name: "Addition".into(), tier: 1 }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

/// Scenario A: correct answer on the first try closes out the session.
#[tokio::test]
async fn scenario_a_correct_answer_completes_session() {
    let supervisor = build_supervisor(Arc::new(AlwaysUnknownDiagnosis), "general");
    let key = SessionKey::new("learner-a");
    let outcome = supervisor
        .start_session(key.clone(), InitArgs { topic: Some(addition_topic()), ..Default::default() })
        .await;
    let handle = outcome.handle().clone();

    handle.handle_user_message("I'm ready").await.unwrap();
    settle().await;
    let snapshot = handle.get_snapshot().await.unwrap();
    assert_eq!(snapshot.psm_state, State::AwaitingAnswer);
    assert_eq!(snapshot.question.as_ref().unwrap().correct_answer, "15");

    handle.handle_user_message("15").await.unwrap();
    settle().await;
    let snapshot = handle.get_snapshot().await.unwrap();
    assert_eq!(snapshot.psm_state, State::SessionComplete);
    assert_eq!(snapshot.metrics.questions_correct, 1);
}

/// Scenario B: an incorrect answer with a high-confidence diagnosis enters
/// known-error remediation, and a readiness signal retries the same
/// question.
#[tokio::test]
async fn scenario_b_known_error_remediation_then_retry() {
    let supervisor = build_supervisor(Arc::new(AlwaysKnownDiagnosis), "general");
    let key = SessionKey::new("learner-b");
    let handle = supervisor
        .start_session(key, InitArgs { topic: Some(addition_topic()), ..Default::default() })
        .await
        .handle()
        .clone();

    handle.handle_user_message("ready").await.unwrap();
    settle().await;
    let before = handle.get_snapshot().await.unwrap();
    let question_text = before.question.as_ref().unwrap().text.clone();

    handle.handle_user_message("wrong answer").await.unwrap();
    settle().await;
    let after = handle.get_snapshot().await.unwrap();
    assert_eq!(after.psm_state, State::RemediatingKnownError);

    handle.handle_user_message("ok, got it").await.unwrap();
    settle().await;
    let retried = handle.get_snapshot().await.unwrap();
    assert_eq!(retried.psm_state, State::AwaitingAnswer);
    assert_eq!(retried.question.as_ref().unwrap().text, question_text);
}

/// Scenario C: an unidentified error moves through a Socratic prompt into
/// guided practice, where a hint can be requested before the student is
/// ready to retry.
#[tokio::test]
async fn scenario_c_unknown_error_guides_then_retries() {
    let supervisor = build_supervisor(Arc::new(AlwaysUnknownDiagnosis), "general");
    let key = SessionKey::new("learner-c");
    let handle = supervisor
        .start_session(key, InitArgs { topic: Some(addition_topic()), ..Default::default() })
        .await
        .handle()
        .clone();

    handle.handle_user_message("ready").await.unwrap();
    settle().await;
    handle.handle_user_message("not sure").await.unwrap();
    settle().await;

    // The Socratic prompt (provide_hint) auto-advances RemediatingUnknownError
    // straight through to GuidingStudent once it lands.
    let after_diagnosis = handle.get_snapshot().await.unwrap();
    assert_eq!(after_diagnosis.psm_state, State::GuidingStudent);

    handle.handle_user_message("I'm still confused").await.unwrap();
    settle().await;
    let still_guiding = handle.get_snapshot().await.unwrap();
    assert_eq!(still_guiding.psm_state, State::GuidingStudent);

    handle.handle_user_message("ok I understand").await.unwrap();
    settle().await;
    let retried = handle.get_snapshot().await.unwrap();
    assert_eq!(retried.psm_state, State::AwaitingAnswer);
}

/// Scenario E: a second message arriving while a check_answer call is
/// outstanding must not trigger a second grading call or corrupt state.
#[tokio::test]
async fn scenario_e_second_message_during_evaluation_is_ignored_by_state() {
    let supervisor = build_supervisor(Arc::new(AlwaysUnknownDiagnosis), "general");
    let key = SessionKey::new("learner-e");
    let handle = supervisor
        .start_session(key, InitArgs { topic: Some(addition_topic()), ..Default::default() })
        .await
        .handle()
        .clone();

    handle.handle_user_message("ready").await.unwrap();
    settle().await;
    handle.handle_user_message("15").await.unwrap();
    handle.handle_user_message("wait, actually 16").await.unwrap();
    settle().await;

    let snapshot = handle.get_snapshot().await.unwrap();
    assert_eq!(snapshot.psm_state, State::SessionComplete);
    assert_eq!(snapshot.metrics.questions_attempted, 1);
}

/// Off-topic chatter in Exposition is classified and answered with an
/// explanation rather than silently ignored or crashing the actor.
#[tokio::test]
async fn general_chatter_in_exposition_gets_an_explanation() {
    let supervisor = build_supervisor(Arc::new(AlwaysUnknownDiagnosis), "request_help");
    let key = SessionKey::new("learner-f");
    let handle = supervisor
        .start_session(key, InitArgs { topic: Some(addition_topic()), ..Default::default() })
        .await
        .handle()
        .clone();

    handle.handle_user_message("what even is addition").await.unwrap();
    settle().await;
    let snapshot = handle.get_snapshot().await.unwrap();
    assert_eq!(snapshot.psm_state, State::Exposition);
    assert!(snapshot.history.iter().any(|h| h.content.contains("Addition combines")));
}

/// `start_session` twice for the same learner returns the same actor; the
/// Supervisor never spawns a duplicate.
#[tokio::test]
async fn duplicate_start_session_reuses_the_running_actor() {
    let supervisor = build_supervisor(Arc::new(AlwaysUnknownDiagnosis), "general");
    let key = SessionKey::new("learner-g");

    let first = supervisor.start_session(key.clone(), InitArgs { topic: Some(addition_topic()), ..Default::default() }).await;
    assert!(matches!(first, StartOutcome::Started(_)));
    let second = supervisor.start_session(key.clone(), InitArgs { topic: Some(addition_topic()), ..Default::default() }).await;
    assert!(matches!(second, StartOutcome::AlreadyRunning(_)));
    assert_eq!(supervisor.active_ids().len(), 1);
}

//! The Session actor: a single-consumer inbox loop owning all state for one
//! learner. Grounded on the teacher's consciousness loop (`queue.rs`) — one
//! `mpsc` inbox, a `match` over the event, `tokio::spawn`'d tool calls that
//! report back over their own channel rather than being awaited inline — but
//! with plain FIFO delivery instead of the teacher's priority reordering,
//! since nothing in this domain needs a human message to jump a tool result.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tutor_core::diagnosis::{classify_diagnosis_with_threshold, intervention_level, Diagnosis};
use tutor_core::protocol::EventMessage;
use tutor_core::psm::{self, Action, Event, State};
use tutor_core::types::{CorrelationToken, HistoryEntry, IntentTag, Metrics, PendingCall, PublicView, Question, SessionKey, Topic};
use tutor_core::SessionCoreConfig;

use tutor_tools::{ToolClient, ToolCompletion, ToolExecutor, ToolOutcome};

use crate::persistence::PersistenceStore;
use crate::session::{SessionEvent, SessionHandle};

/// A sink the actor pushes `EventMessage`s to. The gateway installs one per
/// connected transport; a session with no connection (reconnect window, or
/// none yet) simply drops its output.
pub type TransportSink = Arc<dyn Fn(EventMessage) + Send + Sync>;

struct ActorState {
    psm_state: State,
    topic: Option<Topic>,
    question: Option<Question>,
    history: VecDeque<HistoryEntry>,
    pending_tools: HashMap<CorrelationToken, PendingCall>,
    metrics: Metrics,
    attempt_count: u32,
}

impl ActorState {
    fn fresh() -> Self {
        Self {
            psm_state: psm::initial(),
            topic: None,
            question: None,
            history: VecDeque::new(),
            pending_tools: HashMap::new(),
            metrics: Metrics::new(),
            attempt_count: 0,
        }
    }

    fn from_snapshot(view: PublicView) -> Self {
        Self {
            psm_state: view.psm_state,
            topic: view.topic,
            question: view.question,
            history: view.history.into(),
            pending_tools: HashMap::new(),
            metrics: view.metrics,
            attempt_count: view.attempt_count,
        }
    }
}

pub struct SessionActor {
    learner_id: SessionKey,
    inbox: mpsc::Receiver<SessionEvent>,
    tool_results_tx: mpsc::Sender<ToolCompletion>,
    tool_results: mpsc::Receiver<ToolCompletion>,
    executor: Arc<ToolExecutor>,
    tool_client: Arc<ToolClient>,
    config: Arc<SessionCoreConfig>,
    persistence: Arc<dyn PersistenceStore>,
    transport_sink: Option<TransportSink>,
    state: ActorState,
    resumed: bool,
}

impl SessionActor {
    /// Spawns the actor task and returns a handle to it plus its
    /// `JoinHandle`, so a `Supervisor` can reap the registry entry when the
    /// task exits, whether cleanly or by panic.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        learner_id: SessionKey,
        topic: Option<Topic>,
        restored: Option<PublicView>,
        executor: Arc<ToolExecutor>,
        tool_client: Arc<ToolClient>,
        config: Arc<SessionCoreConfig>,
        persistence: Arc<dyn PersistenceStore>,
        transport_sink: Option<TransportSink>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (inbox_tx, inbox_rx) = mpsc::channel(256);
        let (tool_tx, tool_rx) = mpsc::channel(256);

        let resumed = restored.is_some();
        let mut state = match restored {
            Some(view) => ActorState::from_snapshot(view),
            None => ActorState::fresh(),
        };
        if state.topic.is_none() {
            state.topic = topic;
        }

        let actor = Self {
            learner_id: learner_id.clone(),
            inbox: inbox_rx,
            tool_results_tx: tool_tx,
            tool_results: tool_rx,
            executor,
            tool_client,
            config,
            persistence,
            transport_sink,
            state,
            resumed,
        };

        let handle = SessionHandle {
            learner_id,
            inbox: inbox_tx,
        };
        let join = tokio::spawn(actor.run());
        (handle, join)
    }

    async fn run(mut self) {
        if !self.resumed {
            self.apply_event(Event::Initialized);
        }

        let mut tick = tokio::time::interval(Duration::from_millis(self.config.tick_ms.max(1)));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_event = self.inbox.recv() => {
                    match maybe_event {
                        Some(SessionEvent::UserMessage(content)) => self.handle_user_message(content).await,
                        Some(SessionEvent::GetSnapshot(reply)) => {
                            let _ = reply.send(self.snapshot());
                        }
                        Some(SessionEvent::Shutdown { graceful }) => {
                            self.shutdown(graceful).await;
                            break;
                        }
                        None => {
                            // Every handle dropped; nobody can reach this session again.
                            self.shutdown(self.config.persistence_enabled).await;
                            break;
                        }
                    }
                }
                Some(completion) = self.tool_results.recv() => {
                    self.handle_tool_result(completion).await;
                }
                _ = tick.tick() => {
                    self.handle_tick().await;
                }
            }

            if psm::is_terminal(self.state.psm_state) {
                self.shutdown(true).await;
                break;
            }
        }

        info!(learner_id = %self.learner_id, "session actor stopped");
    }

    // ---- UserMessage dispatch -------------------------------------------

    async fn handle_user_message(&mut self, content: String) {
        self.state.history.push_back(HistoryEntry::user(content.clone()));
        self.trim_history();

        match self.state.psm_state {
            State::Exposition => self.handle_exposition_message(content),
            State::AwaitingAnswer => self.handle_awaiting_answer_message(content),
            State::GuidingStudent => self.handle_guiding_student_message(content),
            State::RemediatingKnownError => self.handle_remediating_known_message(content),
            State::RemediatingUnknownError => self.handle_remediating_unknown_message(content),
            _ => {
                self.emit_system_message("Still working on that, one moment.");
            }
        }

        // Set after the handler runs, since it may push later-timestamped
        // system HistoryEntry's (question text, feedback) of its own.
        self.state.metrics.last_activity = Some(chrono::Utc::now());
    }

    fn handle_exposition_message(&mut self, content: String) {
        if self.is_ready_signal(&content) {
            let Some(topic) = self.state.topic.clone() else {
                self.emit_system_message("Pick a topic to get started.");
                return;
            };
            self.apply_event(Event::InstructionComplete);
            if psm::entry_action(self.state.psm_state) == Action::SelectQuestion {
                let args = serde_json::json!({ "topic": topic });
                self.dispatch_tool("generate_question", args, IntentTag::GenerateQuestion);
            }
        } else {
            self.apply_event(Event::ToolRequested);
            let args = serde_json::json!({ "message": content });
            self.dispatch_tool("classify_intent", args, IntentTag::ClassifyIntent);
        }
    }

    fn handle_awaiting_answer_message(&mut self, content: String) {
        self.apply_event(Event::AnswerReceived);
        let Some(question) = self.state.question.clone() else {
            warn!(learner_id = %self.learner_id, "entered EvaluatingAnswer with no active question");
            return;
        };
        let args = serde_json::json!({ "question": question, "student_answer": content });
        self.dispatch_tool("check_answer", args, IntentTag::CheckAnswer);
    }

    fn handle_guiding_student_message(&mut self, content: String) {
        if self.is_ready_signal(&content) {
            self.apply_event(Event::RetryQuestion);
            self.emit_system_message("Let's try that question again.");
        } else {
            let args = serde_json::json!({
                "question": self.state.question,
                "context": "The student is practising; do not reveal the answer.",
            });
            self.dispatch_tool("provide_hint", args, IntentTag::ProvideHint);
        }
    }

    fn handle_remediating_known_message(&mut self, content: String) {
        if self.is_ready_signal(&content) {
            self.apply_event(Event::RetryQuestion);
            self.emit_system_message("Let's try that question again.");
        } else {
            let args = serde_json::json!({
                "question": self.state.question,
                "context": "The student is working through a known error with remediation in hand.",
            });
            self.dispatch_tool("provide_hint", args, IntentTag::ProvideHint);
        }
    }

    /// `RemediatingUnknownError` only accepts `guidance_complete` in the
    /// transition table — there is no direct path back to `AwaitingAnswer`
    /// from here. A readiness signal at this point moves the conversation
    /// into `GuidingStudent`, the holding state that *does* retry; it does
    /// not skip straight to the question. See scenario documentation in
    /// `DESIGN.md` for why this differs from the known-error sibling.
    fn handle_remediating_unknown_message(&mut self, content: String) {
        if self.is_ready_signal(&content) {
            self.apply_event(Event::GuidanceComplete);
            self.emit_system_message("Let's go over this together, step by step.");
        } else {
            let args = serde_json::json!({
                "question": self.state.question,
                "context": "Ask a guiding question toward the answer; do not reveal it.",
            });
            self.dispatch_tool("provide_hint", args, IntentTag::ProvideHint);
        }
    }

    fn is_ready_signal(&self, content: &str) -> bool {
        let lower = content.to_lowercase();
        self.config.readiness_keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }

    // ---- ToolResult dispatch ---------------------------------------------

    async fn handle_tool_result(&mut self, completion: ToolCompletion) {
        let Some(pending) = self.state.pending_tools.remove(&completion.token) else {
            debug!(token = %completion.token, "tool result for unknown or already-resolved token, ignoring");
            return;
        };

        match completion.outcome {
            ToolOutcome::Cancelled => {
                debug!(%pending.tool_name, "tool call cancelled");
            }
            ToolOutcome::Timeout => {
                warn!(%pending.tool_name, "tool call timed out, applying fallback");
                self.emit_event(EventMessage::error(
                    self.learner_id.as_str(),
                    format!("{} took too long, using a backup answer.", pending.tool_name),
                ));
                let fallback = self.tool_client.fallback(&pending.tool_name, &pending.reply_context);
                self.apply_tool_value(pending.intent_tag, fallback);
            }
            ToolOutcome::Err(reason) => {
                warn!(%pending.tool_name, %reason, "tool call errored, applying fallback");
                self.emit_event(EventMessage::error(
                    self.learner_id.as_str(),
                    format!("{} had trouble just now, using a backup answer.", pending.tool_name),
                ));
                let fallback = self.tool_client.fallback(&pending.tool_name, &pending.reply_context);
                self.apply_tool_value(pending.intent_tag, fallback);
            }
            ToolOutcome::Ok(value) => {
                self.apply_tool_value(pending.intent_tag, value);
            }
        }
    }

    fn apply_tool_value(&mut self, intent_tag: IntentTag, value: serde_json::Value) {
        match intent_tag {
            IntentTag::GenerateQuestion => self.on_generate_question(value),
            IntentTag::CheckAnswer => self.on_check_answer(value),
            IntentTag::DiagnoseError => self.on_diagnose_error(value),
            IntentTag::CreateRemediation => self.on_plain_text(value),
            IntentTag::ProvideHint => self.on_provide_hint(value),
            IntentTag::ExplainConcept => self.on_explain_concept(value),
            IntentTag::ClassifyIntent => self.on_classify_intent(value),
        }
    }

    fn on_generate_question(&mut self, value: serde_json::Value) {
        match serde_json::from_value::<Question>(value) {
            Ok(question) => {
                self.state.question = Some(question.clone());
                self.state.attempt_count = 0;
                self.apply_event(Event::QuestionPresented);
                self.emit_system_message(question.text);
            }
            Err(err) => {
                warn!(%err, "generate_question produced an unparseable question");
                self.emit_system_message("I had trouble preparing a question — let's try once more.");
            }
        }
    }

    fn on_check_answer(&mut self, value: serde_json::Value) {
        let is_correct = value.get("is_correct").and_then(serde_json::Value::as_bool).unwrap_or(false);
        let feedback = value
            .get("feedback")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(if is_correct { "Correct!" } else { "Not quite." })
            .to_string();

        self.state.metrics.questions_attempted += 1;

        if is_correct {
            self.state.metrics.questions_correct += 1;
            if let Some(topic) = &self.state.topic {
                self.state.metrics.topics_covered.insert(topic.name.clone());
            }
            self.emit_system_message(feedback);
            self.apply_event(Event::AnswerCorrect);
            // No external syllabus source is wired into this core: every
            // question answered correctly closes the session, matching the
            // single-topic scenario the transition table is built around.
            self.apply_event(Event::SyllabusComplete);
        } else {
            self.state.attempt_count += 1;
            self.emit_system_message(feedback);
            let question = self.state.question.clone();
            let args = serde_json::json!({
                "question": question,
                "answer_data": {
                    "student_answer": value.get("student_answer").cloned().unwrap_or(serde_json::Value::Null),
                    "correct_answer": value.get("correct_answer").cloned().unwrap_or(serde_json::Value::Null),
                    "is_correct": false,
                },
            });
            self.dispatch_tool("diagnose_error", args, IntentTag::DiagnoseError);
        }
    }

    fn on_diagnose_error(&mut self, value: serde_json::Value) {
        let diagnosis = classify_diagnosis_with_threshold(&value, self.config.diagnosis_known_threshold);
        let level = intervention_level(self.state.attempt_count, diagnosis.confidence());

        match diagnosis {
            Diagnosis::Known { remediation_hint, .. } => {
                self.apply_event(Event::KnownErrorDetected);
                let topic = self.state.topic.clone();
                let args = serde_json::json!({
                    "topic": topic,
                    "diagnosis": value,
                    "remediation_hint": remediation_hint,
                    "intervention_level": format!("{:?}", level),
                });
                self.dispatch_tool("create_remediation", args, IntentTag::CreateRemediation);
            }
            Diagnosis::Unknown { .. } => {
                self.apply_event(Event::UnknownErrorDetected);
                let args = serde_json::json!({
                    "question": self.state.question,
                    "context": "Ask a single Socratic question that nudges toward the error without naming it.",
                    "intervention_level": format!("{:?}", level),
                });
                self.dispatch_tool("provide_hint", args, IntentTag::ProvideHint);
            }
        }
    }

    fn on_plain_text(&mut self, value: serde_json::Value) {
        self.emit_text(value);
    }

    fn on_provide_hint(&mut self, value: serde_json::Value) {
        self.emit_text(value);
        if self.state.psm_state == State::RemediatingUnknownError {
            self.apply_event(Event::GuidanceComplete);
        }
        // In GuidingStudent / RemediatingKnownError the hint is just another
        // turn in the sub-dialogue; the state does not change until the
        // student signals readiness.
    }

    fn on_explain_concept(&mut self, value: serde_json::Value) {
        self.emit_text(value);
        if self.state.psm_state == State::AwaitingToolResult {
            self.apply_event(Event::ToolCompleted);
        }
    }

    fn on_classify_intent(&mut self, value: serde_json::Value) {
        let intent = value.as_str().unwrap_or("general");
        if intent == "request_question" {
            if let Some(topic) = self.state.topic.clone() {
                self.apply_event(Event::InstructionComplete);
                let args = serde_json::json!({ "topic": topic });
                self.dispatch_tool("generate_question", args, IntentTag::GenerateQuestion);
                return;
            }
        }
        let message = self
            .state
            .history
            .back()
            .map(|entry| entry.content.clone())
            .unwrap_or_default();
        let args = serde_json::json!({ "topic": self.state.topic, "message": message });
        self.dispatch_tool("explain_concept", args, IntentTag::ExplainConcept);
    }

    // ---- Tool dispatch plumbing -------------------------------------------

    fn dispatch_tool(&mut self, tool_name: &'static str, args: serde_json::Value, intent_tag: IntentTag) {
        match self.executor.submit(
            tool_name,
            args.clone(),
            Some(self.config.tool_deadline_ms),
            self.tool_results_tx.clone(),
        ) {
            Ok(token) => {
                self.state.pending_tools.insert(
                    token,
                    PendingCall {
                        tool_name: tool_name.to_string(),
                        started_at: chrono::Utc::now(),
                        deadline_ms: self.config.tool_deadline_ms,
                        intent_tag,
                        reply_context: args,
                    },
                );
            }
            Err(busy) => {
                warn!(tool = tool_name, %busy, "executor busy, applying fallback without a round trip");
                let fallback = self.tool_client.fallback(tool_name, &args);
                self.apply_tool_value(intent_tag, fallback);
            }
        }
    }

    // ---- Tick, shutdown, persistence --------------------------------------

    async fn handle_tick(&mut self) {
        let idle_ms = self
            .state
            .metrics
            .last_activity
            .map(|t| (chrono::Utc::now() - t).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        if idle_ms >= self.config.inactivity_ms {
            info!(learner_id = %self.learner_id, idle_ms, "session inactive, shutting down gracefully");
            self.shutdown(true).await;
            self.apply_event_force_terminal();
            return;
        }

        if self.config.persistence_enabled {
            self.persist().await;
        }
    }

    /// Forces the run loop to exit on the next iteration check without
    /// pretending a PSM event fired. Inactivity shutdown is a lifecycle
    /// decision, not a pedagogical transition, so it does not route through
    /// `apply_event`/`SessionComplete`.
    fn apply_event_force_terminal(&mut self) {
        self.state.psm_state = State::SessionComplete;
    }

    async fn shutdown(&mut self, graceful: bool) {
        for pending in self.state.pending_tools.drain() {
            self.executor.cancel(pending.0);
        }
        if graceful && self.config.persistence_enabled {
            self.persist().await;
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.persistence.persist(self.learner_id.as_str(), &self.snapshot()).await {
            warn!(learner_id = %self.learner_id, %err, "failed to persist session snapshot");
        }
    }

    // ---- Shared helpers ----------------------------------------------------

    fn apply_event(&mut self, event: Event) {
        match psm::transition(self.state.psm_state, event) {
            Ok(next) => {
                debug!(learner_id = %self.learner_id, from = %self.state.psm_state, %event, to = %next, "psm transition");
                self.state.psm_state = next;
                self.emit_event(EventMessage::state_change(self.learner_id.as_str(), next));
            }
            Err(invalid) => {
                warn!(learner_id = %self.learner_id, %invalid, "rejected transition");
            }
        }
    }

    fn emit_text(&mut self, value: serde_json::Value) {
        let text = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        self.emit_system_message(text);
    }

    fn emit_system_message(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.state.history.push_back(HistoryEntry::system(content.clone()));
        self.trim_history();
        self.state.metrics.last_activity = Some(chrono::Utc::now());
        self.emit_event(EventMessage::system_message(self.learner_id.as_str(), content));
    }

    fn emit_event(&self, event: EventMessage) {
        if let Some(sink) = &self.transport_sink {
            sink(event);
        }
    }

    fn trim_history(&mut self) {
        while self.state.history.len() > self.config.history_retained {
            self.state.history.pop_front();
        }
    }

    fn snapshot(&self) -> PublicView {
        PublicView {
            learner_id: self.learner_id.as_str().to_string(),
            psm_state: self.state.psm_state,
            topic: self.state.topic.clone(),
            question: self.state.question.clone(),
            history: self.state.history.iter().cloned().collect(),
            metrics: self.state.metrics.clone(),
            attempt_count: self.state.attempt_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tutor_tools::{ExecutorConfig, PedagogicalTool, ToolCallError};

    use crate::persistence::NullPersistence;

    struct FakeQuestionTool;
    #[async_trait]
    impl PedagogicalTool for FakeQuestionTool {
        fn name(&self) -> &'static str {
            "generate_question"
        }
        async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value, ToolCallError> {
            Ok(serde_json::json!({
                "text": "What is 2 + 2?",
                "correct_answer": "4",
                "type": "short_answer",
                "difficulty": 1,
                "hint": null,
            }))
        }
        fn fallback(&self, _args: &serde_json::Value) -> serde_json::Value {
            serde_json::json!({
                "text": "What is 1 + 1?",
                "correct_answer": "2",
                "type": "short_answer",
                "difficulty": 1,
                "hint": null,
            })
        }
    }

    struct FakeCheckAnswerTool {
        calls: AtomicUsize,
    }
    #[async_trait]
    impl PedagogicalTool for FakeCheckAnswerTool {
        fn name(&self) -> &'static str {
            "check_answer"
        }
        async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value, ToolCallError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = args.get("student_answer").and_then(serde_json::Value::as_str).unwrap_or("");
            Ok(serde_json::json!({
                "is_correct": answer == "4",
                "feedback": if answer == "4" { "Correct!" } else { "Try again." },
                "student_answer": answer,
                "correct_answer": "4",
            }))
        }
        fn fallback(&self, _args: &serde_json::Value) -> serde_json::Value {
            serde_json::json!({ "is_correct": false, "feedback": "fallback", "student_answer": "", "correct_answer": "4" })
        }
    }

    fn test_executor() -> Arc<ToolExecutor> {
        let mut client = ToolClient::new();
        client.register(Arc::new(FakeQuestionTool));
        client.register(Arc::new(FakeCheckAnswerTool { calls: AtomicUsize::new(0) }));
        Arc::new(ToolExecutor::new(Arc::new(client), ExecutorConfig::default()))
    }

    fn test_client() -> Arc<ToolClient> {
        let mut client = ToolClient::new();
        client.register(Arc::new(FakeQuestionTool));
        client.register(Arc::new(FakeCheckAnswerTool { calls: AtomicUsize::new(0) }));
        Arc::new(client)
    }

    fn test_config() -> Arc<SessionCoreConfig> {
        Arc::new(SessionCoreConfig {
            tick_ms: 60_000,
            ..SessionCoreConfig::default()
        })
    }

    #[tokio::test]
    async fn ready_signal_in_exposition_leads_to_a_question() {
        let (handle, _join) = SessionActor::spawn(
            SessionKey::new("alice"),
            Some(Topic { id: "1".into(), name: "Addition".into(), tier: 1 }),
            None,
            test_executor(),
            test_client(),
            test_config(),
            Arc::new(NullPersistence),
            None,
        );

        handle.handle_user_message("I'm ready").await.unwrap();
        // Allow the spawned tool task and actor loop to run.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snapshot = handle.get_snapshot().await.unwrap();
        assert_eq!(snapshot.psm_state, State::AwaitingAnswer);
        assert!(snapshot.question.is_some());
    }

    #[tokio::test]
    async fn correct_answer_completes_the_session() {
        let (handle, _join) = SessionActor::spawn(
            SessionKey::new("bob"),
            Some(Topic { id: "1".into(), name: "Addition".into(), tier: 1 }),
            None,
            test_executor(),
            test_client(),
            test_config(),
            Arc::new(NullPersistence),
            None,
        );

        handle.handle_user_message("ready").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.handle_user_message("4").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snapshot = handle.get_snapshot().await.unwrap();
        assert_eq!(snapshot.psm_state, State::SessionComplete);
        assert_eq!(snapshot.metrics.questions_correct, 1);
    }

    #[tokio::test]
    async fn a_second_message_while_evaluating_does_not_double_submit() {
        let (handle, _join) = SessionActor::spawn(
            SessionKey::new("carol"),
            Some(Topic { id: "1".into(), name: "Addition".into(), tier: 1 }),
            None,
            test_executor(),
            test_client(),
            test_config(),
            Arc::new(NullPersistence),
            None,
        );

        handle.handle_user_message("ready").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.handle_user_message("4").await.unwrap();
        // Fired immediately after, before the first check_answer could have
        // resolved in a slower environment; the actor must not dispatch a
        // second check_answer call while EvaluatingAnswer.
        handle.handle_user_message("wait, 5").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let snapshot = handle.get_snapshot().await.unwrap();
        assert_eq!(snapshot.psm_state, State::SessionComplete);
    }
}

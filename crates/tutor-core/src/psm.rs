//! The Pedagogical State Machine: a pure, deterministic transition function
//! over session state. No I/O, no logging, no clock reads — every observable
//! effect of a lesson lives in the Session that drives this machine.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Initializing,
    Exposition,
    SettingQuestion,
    AwaitingAnswer,
    EvaluatingAnswer,
    ProvidingFeedbackCorrect,
    RemediatingKnownError,
    RemediatingUnknownError,
    GuidingStudent,
    AwaitingToolResult,
    SessionComplete,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Initialized,
    InstructionComplete,
    QuestionPresented,
    AnswerReceived,
    AnswerCorrect,
    KnownErrorDetected,
    UnknownErrorDetected,
    GuidanceComplete,
    RetryQuestion,
    NextTopic,
    SyllabusComplete,
    ToolRequested,
    ToolCompleted,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The entry action associated with a state: what the Session should kick off
/// the moment it arrives in that state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    None,
    SelectQuestion,
    EvaluateAnswer,
    Diagnose,
    CreateRemediation,
    SocraticPrompt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    PrimaryLearning,
    Remediation,
    Guidance,
    Terminal,
}

/// Raised by `transition` when `(state, event)` has no entry in the table.
/// Never a crash — the Session catches this and emits a "still processing"
/// notice without changing state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition: {state} does not accept {event}")]
pub struct InvalidTransition {
    pub state: State,
    pub event: Event,
}

pub fn initial() -> State {
    State::Initializing
}

/// The complete transition table from the specification. Any pair not listed
/// here is rejected.
pub fn transition(state: State, event: Event) -> Result<State, InvalidTransition> {
    use Event::*;
    use State::*;

    let next = match (state, event) {
        (Initializing, Initialized) => Exposition,
        (Exposition, InstructionComplete) => SettingQuestion,
        (Exposition, ToolRequested) => AwaitingToolResult,
        (SettingQuestion, QuestionPresented) => AwaitingAnswer,
        (SettingQuestion, ToolRequested) => AwaitingToolResult,
        (AwaitingAnswer, AnswerReceived) => EvaluatingAnswer,
        (EvaluatingAnswer, AnswerCorrect) => ProvidingFeedbackCorrect,
        (EvaluatingAnswer, KnownErrorDetected) => RemediatingKnownError,
        (EvaluatingAnswer, UnknownErrorDetected) => RemediatingUnknownError,
        (ProvidingFeedbackCorrect, NextTopic) => Exposition,
        (ProvidingFeedbackCorrect, SyllabusComplete) => SessionComplete,
        (RemediatingKnownError, RetryQuestion) => AwaitingAnswer,
        (RemediatingUnknownError, GuidanceComplete) => GuidingStudent,
        (GuidingStudent, RetryQuestion) => AwaitingAnswer,
        (AwaitingToolResult, ToolCompleted) => Exposition,
        (AwaitingToolResult, QuestionPresented) => AwaitingAnswer,
        (AwaitingToolResult, InstructionComplete) => SettingQuestion,
        _ => return Err(InvalidTransition { state, event }),
    };
    Ok(next)
}

pub fn valid_events(state: State) -> HashSet<Event> {
    use Event::*;
    use State::*;

    let events: &[Event] = match state {
        Initializing => &[Initialized],
        Exposition => &[InstructionComplete, ToolRequested],
        SettingQuestion => &[QuestionPresented, ToolRequested],
        AwaitingAnswer => &[AnswerReceived],
        EvaluatingAnswer => &[AnswerCorrect, KnownErrorDetected, UnknownErrorDetected],
        ProvidingFeedbackCorrect => &[NextTopic, SyllabusComplete],
        RemediatingKnownError => &[RetryQuestion],
        RemediatingUnknownError => &[GuidanceComplete],
        GuidingStudent => &[RetryQuestion],
        AwaitingToolResult => &[ToolCompleted, QuestionPresented, InstructionComplete],
        SessionComplete => &[],
    };
    events.iter().copied().collect()
}

pub fn entry_action(state: State) -> Action {
    match state {
        State::SettingQuestion => Action::SelectQuestion,
        State::EvaluatingAnswer => Action::EvaluateAnswer,
        State::RemediatingKnownError => Action::CreateRemediation,
        State::RemediatingUnknownError => Action::SocraticPrompt,
        _ => Action::None,
    }
}

/// This is a coarse per-state signal, not the same thing as "the Session has
/// a dedicated handler for this state" — see `tutor_session::actor` for the
/// exact set of states with a dedicated `UserMessage` handler (it includes
/// the two remediation states, which this function does not).
pub fn accepts_user_input(state: State) -> bool {
    matches!(
        state,
        State::AwaitingAnswer | State::GuidingStudent | State::Exposition
    )
}

pub fn requires_tool(state: State) -> bool {
    matches!(
        state,
        State::EvaluatingAnswer
            | State::RemediatingKnownError
            | State::RemediatingUnknownError
            | State::AwaitingToolResult
    )
}

pub fn is_terminal(state: State) -> bool {
    matches!(state, State::SessionComplete)
}

pub fn flow(state: State) -> Flow {
    match state {
        State::Initializing
        | State::Exposition
        | State::SettingQuestion
        | State::AwaitingAnswer
        | State::EvaluatingAnswer
        | State::ProvidingFeedbackCorrect
        | State::AwaitingToolResult => Flow::PrimaryLearning,
        State::RemediatingKnownError => Flow::Remediation,
        State::RemediatingUnknownError | State::GuidingStudent => Flow::Guidance,
        State::SessionComplete => Flow::Terminal,
    }
}

//! Tool Client and Tool Executor — the fixed set of pedagogical operations
//! a session can call out for, and the bounded, cancellable machinery that
//! runs them without blocking a session's own event loop.

pub mod client;
pub mod executor;
pub mod tools;

pub use client::{PedagogicalTool, ToolCallError, ToolClient};
pub use executor::{Busy, ExecutorConfig, ToolCompletion, ToolExecutor, ToolOutcome};

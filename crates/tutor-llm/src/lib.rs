//! LLM provider adapters with streaming support — the external collaborator
//! the Tool Client calls through.

pub mod anthropic;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use provider::{complete, LlmError, LlmProvider, LlmResult, LlmStream};
pub use types::*;
